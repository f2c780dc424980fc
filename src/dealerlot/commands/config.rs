use crate::commands::{CmdMessage, CmdResult, DealerPaths};
use crate::config::DealerConfig;
use crate::error::Result;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub fn run(paths: &DealerPaths, action: ConfigAction) -> Result<CmdResult> {
    let mut config = DealerConfig::load(&paths.data)?;
    let mut result = CmdResult::default();
    match action {
        ConfigAction::ShowAll => Ok(result.with_config(config)),
        ConfigAction::ShowKey(key) => {
            match config.get(&key) {
                Some(val) => result.add_message(CmdMessage::info(format!("{} = {}", key, val))),
                None => {
                    result.add_message(CmdMessage::error(format!("Unknown config key: {}", key)))
                }
            }
            Ok(result)
        }
        ConfigAction::Set(key, value) => {
            if let Err(e) = config.set(&key, &value) {
                result.add_message(CmdMessage::error(e));
                return Ok(result);
            }
            config.save(&paths.data)?;
            let shown = config.get(&key).unwrap_or(value);
            result.add_message(CmdMessage::success(format!("{} set to {}", key, shown)));
            Ok(result.with_config(config))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;

    #[test]
    fn set_then_show() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DealerPaths {
            data: dir.path().to_path_buf(),
        };

        let res = run(
            &paths,
            ConfigAction::Set("backup_retention".into(), "7".into()),
        )
        .unwrap();
        assert_eq!(res.messages[0].level, MessageLevel::Success);

        let res = run(&paths, ConfigAction::ShowKey("backup_retention".into())).unwrap();
        assert_eq!(res.messages[0].content, "backup_retention = 7");

        let res = run(&paths, ConfigAction::ShowAll).unwrap();
        assert_eq!(res.config.unwrap().backup_retention, 7);
    }

    #[test]
    fn invalid_set_reports_error_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DealerPaths {
            data: dir.path().to_path_buf(),
        };
        let res = run(&paths, ConfigAction::Set("colour".into(), "red".into())).unwrap();
        assert_eq!(res.messages[0].level, MessageLevel::Error);
        assert!(!dir.path().join("config.json").exists());
    }
}
