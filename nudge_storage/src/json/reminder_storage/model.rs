use std::path::PathBuf;

use nudge_models::reminder::{
    ParseFireTimeError, Reminder, ReminderId, ReminderStyle, new_reminder_id,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const POPUP_LABEL: &str = "彈窗";
const BANNER_LABEL: &str = "彈幕";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    InvalidTime(#[from] ParseFireTimeError),

    #[error("Unknown reminder type {0:?}")]
    UnknownStyle(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReminderStorageModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ReminderId>,
    pub time: String,
    pub action: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl From<Reminder> for ReminderStorageModel {
    fn from(value: Reminder) -> Self {
        Self {
            id: Some(value.id),
            time: value.fire_at.to_string(),
            action: value.text,
            kind: convert_style(value.style).to_owned(),
            image: Some(
                value
                    .media_path
                    .map(|path| path.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
        }
    }
}

impl TryFrom<ReminderStorageModel> for Reminder {
    type Error = ModelError;

    fn try_from(value: ReminderStorageModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.unwrap_or_else(new_reminder_id),
            fire_at: value.time.parse()?,
            text: value.action,
            style: parse_style(&value.kind)?,
            media_path: value
                .image
                .filter(|image| !image.is_empty())
                .map(PathBuf::from),
        })
    }
}

fn convert_style(style: ReminderStyle) -> &'static str {
    match style {
        ReminderStyle::Popup => POPUP_LABEL,
        ReminderStyle::Banner => BANNER_LABEL,
    }
}

fn parse_style(kind: &str) -> Result<ReminderStyle, ModelError> {
    match kind {
        POPUP_LABEL => Ok(ReminderStyle::Popup),
        BANNER_LABEL => Ok(ReminderStyle::Banner),
        other if other.eq_ignore_ascii_case("popup") => Ok(ReminderStyle::Popup),
        other if other.eq_ignore_ascii_case("banner") => Ok(ReminderStyle::Banner),
        other => Err(ModelError::UnknownStyle(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use nudge_models::reminder::ReminderFireTime;

    use super::*;

    fn model(time: &str, kind: &str, image: Option<&str>) -> ReminderStorageModel {
        ReminderStorageModel {
            id: None,
            time: time.to_owned(),
            action: "Stretch".to_owned(),
            kind: kind.to_owned(),
            image: image.map(str::to_owned),
        }
    }

    #[test]
    fn popup_without_media_is_written_with_empty_image() {
        let reminder = Reminder {
            id: new_reminder_id(),
            fire_at: ReminderFireTime::from_hms(8, 0, 0).unwrap(),
            text: "Stretch".to_owned(),
            style: ReminderStyle::Popup,
            media_path: None,
        };

        let model = ReminderStorageModel::from(reminder);

        assert_eq!(model.time, "08:00:00");
        assert_eq!(model.kind, POPUP_LABEL);
        assert_eq!(model.image.as_deref(), Some(""));
    }

    #[test]
    fn empty_or_missing_image_means_no_media() {
        for image in [None, Some("")] {
            let reminder = Reminder::try_from(model("08:00:00", POPUP_LABEL, image)).unwrap();
            assert_eq!(reminder.media_path, None);
        }
    }

    #[test]
    fn banner_label_and_english_aliases_are_accepted() {
        let banner = Reminder::try_from(model("08:00:00", BANNER_LABEL, None)).unwrap();
        let popup = Reminder::try_from(model("08:00:00", "Popup", None)).unwrap();

        assert_eq!(banner.style, ReminderStyle::Banner);
        assert_eq!(popup.style, ReminderStyle::Popup);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = Reminder::try_from(model("08:00:00", "toast", None));

        assert!(matches!(result, Err(ModelError::UnknownStyle(kind)) if kind == "toast"));
    }

    #[test]
    fn malformed_time_is_rejected() {
        let result = Reminder::try_from(model("8 o'clock", POPUP_LABEL, None));

        assert!(matches!(result, Err(ModelError::InvalidTime(_))));
    }

    #[test]
    fn missing_id_gets_a_fresh_one() {
        let first = Reminder::try_from(model("10:00:00", POPUP_LABEL, None)).unwrap();
        let second = Reminder::try_from(model("10:00:00", POPUP_LABEL, None)).unwrap();

        assert_ne!(first.id, second.id);
    }
}
