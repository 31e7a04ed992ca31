use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    Deserialize,
    Serialize,
};
use tracing::debug;

use crate::core::WanipopError;

const APP_NAME: &str = "wanipop";

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

pub fn save_json_to<T: Serialize>(data: &T, path: &Path) -> Result<(), WanipopError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    debug!("Data saved to: {}", path.display());
    Ok(())
}

/// Missing files load as `None`
pub fn load_json_from<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, WanipopError> {
    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(path)?;
    let data: T = serde_json::from_str(&json)?;
    debug!("Data loaded from: {}", path.display());
    Ok(Some(data))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        let data = HashMap::from([("batch".to_string(), 5u32)]);
        save_json_to(&data, &path).unwrap();

        let loaded: Option<HashMap<String, u32>> = load_json_from(&path).unwrap();
        assert_eq!(loaded, Some(data));
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Option<Vec<u32>> = load_json_from(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let loaded: Result<Option<Vec<u32>>, _> = load_json_from(&path);
        assert!(matches!(loaded, Err(WanipopError::Json(_))));
    }
}
