use std::{
    fs::{self, File},
    io::{self, BufWriter, Write as _},
    path::Path,
};

use anyhow::Context;
use serde::{Serialize, de::DeserializeOwned};

use crate::schema::{champion::ChampionFile, replay::ReplayFile};

/// Creates the parent directories of `path` if needed.
pub fn create_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(())
}

/// Writes `value` as pretty-printed JSON, replacing any existing file.
pub fn write_json_file<T>(path: &Path, value: &T) -> anyhow::Result<()>
where
    T: Serialize,
{
    create_parent_dir(path)?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write JSON to {}", path.display()))?;
    writeln!(writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to flush output to {}", path.display()))?;
    Ok(())
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {file_kind} file: {}", path.display()))?;
    serde_json::from_reader(io::BufReader::new(file))
        .with_context(|| format!("Failed to parse {file_kind} JSON file: {}", path.display()))
}

pub fn read_champion_file<P>(path: P) -> anyhow::Result<ChampionFile>
where
    P: AsRef<Path>,
{
    read_json_file("champion", path)
}

pub fn read_replay_file<P>(path: P) -> anyhow::Result<ReplayFile>
where
    P: AsRef<Path>,
{
    read_json_file("replay", path)
}

#[cfg(test)]
mod tests {
    use serpentine_training::champion::ChampionSnapshot;

    use super::*;

    #[test]
    fn test_champion_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("serpentine-util-{}", std::process::id()));
        let path = dir.join("a/b/champion.json");
        let file = ChampionFile {
            saved_at: None,
            network: None,
            robustness: Some(812.5),
            snapshot: ChampionSnapshot {
                generation: 250,
                fitness: 5395.0,
                ticks: 87,
                fruits: 1,
                genome: vec![0.25, -0.5, 1.0],
            },
        };
        write_json_file(&path, &file).unwrap();
        let loaded = read_champion_file(&path).unwrap();
        assert_eq!(loaded.snapshot, file.snapshot);
        assert_eq!(loaded.robustness, Some(812.5));
        assert!(loaded.saved_at.is_none());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_bare_snapshot_loads_as_champion() {
        let dir =
            std::env::temp_dir().join(format!("serpentine-util-bare-{}", std::process::id()));
        let path = dir.join("champion.json");
        create_parent_dir(&path).unwrap();
        fs::write(
            &path,
            r#"{"generation": 3, "fitness": 12.0, "ticks": 9, "fruits": 0, "genome": [0.5]}"#,
        )
        .unwrap();
        let loaded = read_champion_file(&path).unwrap();
        assert_eq!(loaded.snapshot.genome, [0.5]);
        assert!(loaded.network.is_none());
        fs::remove_dir_all(&dir).unwrap();

        assert!(read_replay_file(dir.join("missing.json")).is_err());
    }
}
