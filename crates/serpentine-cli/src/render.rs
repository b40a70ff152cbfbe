use std::{
    fmt::Write as _,
    io::{self, Write as _},
};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use serpentine_engine::{Action, Heading, Position, Simulation};

const EMPTY: &str = " ·";
const BODY: &str = " █";
const FRUIT: &str = " ●";

/// Draws the grid, the status line and, after death, its cause.
///
/// Each cell is two characters wide. `action` is the action about to be
/// applied, if any.
pub fn render_frame(sim: &Simulation, action: Option<Action>) -> String {
    let config = sim.config();
    let (width, height) = (config.width(), config.height());

    let mut cells = vec![EMPTY; width * height];
    let mut put = |pos: Position, glyph: &'static str| {
        if let (Ok(x), Ok(y)) = (usize::try_from(pos.x), usize::try_from(pos.y)) {
            if x < width && y < height {
                cells[y * width + x] = glyph;
            }
        }
    };
    if let Some(fruit) = sim.fruit() {
        put(fruit, FRUIT);
    }
    for pos in sim.body().iter().skip(1) {
        put(pos, BODY);
    }
    put(sim.head(), head_glyph(sim.heading()));

    let border = "──".repeat(width);
    let mut frame = String::new();
    writeln!(frame, "┌{border}┐").unwrap();
    for row in cells.chunks(width) {
        writeln!(frame, "│{}│", row.concat()).unwrap();
    }
    writeln!(frame, "└{border}┘").unwrap();

    let action = action.map_or_else(|| "---".to_owned(), |a| a.to_string().to_uppercase());
    writeln!(
        frame,
        "  Tick: {:3} | Fruits: {} | Length: {} | Action: {action}",
        sim.tick(),
        sim.fruits_eaten(),
        sim.body_len(),
    )
    .unwrap();
    if !sim.is_alive() {
        writeln!(frame, "  DEAD: {}", sim.death_cause()).unwrap();
    }
    frame
}

/// Clears the terminal and draws `frame` from the top-left corner.
pub fn draw(frame: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    queue!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
    for line in frame.lines() {
        queue!(stdout, Print(line), Print("\r\n"))?;
    }
    stdout.flush()
}

fn head_glyph(heading: Heading) -> &'static str {
    match heading {
        Heading::Up => " ▲",
        Heading::Right => " ▶",
        Heading::Down => " ▼",
        Heading::Left => " ◀",
    }
}

#[cfg(test)]
mod tests {
    use serpentine_engine::EnvConfig;

    use super::*;

    #[test]
    fn test_initial_frame() {
        let config = EnvConfig::new(4, 3, 2, 100, 100, false).unwrap();
        let sim = Simulation::new(&config, 0);
        let frame = render_frame(&sim, Some(Action::Straight));
        let lines = frame.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "┌────────┐");
        assert_eq!(lines[1], "│ · · · ·│");
        assert_eq!(lines[2], "│ · █ ▶ ·│");
        assert_eq!(lines[3], "│ · · · ·│");
        assert_eq!(lines[4], "└────────┘");
        assert_eq!(
            lines[5],
            "  Tick:   0 | Fruits: 0 | Length: 2 | Action: STRAIGHT"
        );
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_dead_frame_shows_cause() {
        let config = EnvConfig::new(3, 3, 1, 100, 100, false).unwrap();
        let mut sim = Simulation::new(&config, 0);
        sim.step(Action::Straight);
        sim.step(Action::Straight);
        assert!(!sim.is_alive());
        let frame = render_frame(&sim, None);
        assert!(frame.contains("Action: ---"));
        assert!(frame.ends_with("  DEAD: wall\n"));
    }

    #[test]
    fn test_fruit_is_drawn() {
        let config = EnvConfig::new(5, 5, 1, 100, 100, true).unwrap();
        let sim = Simulation::new(&config, 3);
        let frame = render_frame(&sim, None);
        assert_eq!(frame.matches('●').count(), 1);
    }
}
