use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::error::{PortalError, Result};
use crate::models::{Notification, NotificationSettings, NotificationType, PortalData};
use crate::storage::SETTINGS_KEY;
use crate::store::{Store, new_id};

/// Appends a notification unless `settings` mute its kind.
pub(crate) fn push_notification(
    data: &mut PortalData,
    settings: &NotificationSettings,
    user_id: &str,
    kind: NotificationType,
    title: &str,
    message: &str,
    now: DateTime<Utc>,
) -> bool {
    if !settings.allows(kind) {
        debug!(user_id, "Muted {kind} notification");
        return false;
    }
    data.notifications.push(Notification {
        id: new_id(),
        user_id: user_id.to_string(),
        kind,
        title: title.to_string(),
        message: message.to_string(),
        timestamp: now,
        read: false,
    });
    true
}

/// Unread notifications addressed to `user_id`.
pub fn unread_count(data: &PortalData, user_id: &str) -> usize {
    data.notifications
        .iter()
        .filter(|n| n.user_id == user_id && !n.read)
        .count()
}

fn welcome_notifications(user_id: &str, now: DateTime<Utc>) -> [Notification; 2] {
    [
        Notification {
            id: new_id(),
            user_id: user_id.to_string(),
            kind: NotificationType::System,
            title: "Welcome to PlacementHub!".to_string(),
            message: "Your account is ready. Explore jobs and track your applications here."
                .to_string(),
            timestamp: now - Duration::minutes(1),
            read: false,
        },
        Notification {
            id: new_id(),
            user_id: user_id.to_string(),
            kind: NotificationType::System,
            title: "Complete your profile".to_string(),
            message: "Add your skills and upload a resume to get better job matches.".to_string(),
            timestamp: now,
            read: false,
        },
    ]
}

impl Store {
    pub fn notification_settings(&self) -> Result<NotificationSettings> {
        Ok(self.read_json(SETTINGS_KEY)?.unwrap_or_default())
    }

    pub fn save_notification_settings(&self, settings: &NotificationSettings) -> Result<()> {
        self.write_json(SETTINGS_KEY, settings)
    }

    /// The user's notifications, newest first. A user with none gets the two
    /// welcome notifications written to the blob first.
    pub fn get_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        let mut data = self.get_data()?;
        if !data.notifications.iter().any(|n| n.user_id == user_id) {
            data.notifications
                .extend(welcome_notifications(user_id, Utc::now()));
            self.save_data(&data)?;
            info!(user_id, "Injected welcome notifications");
        }

        let mut notifications: Vec<Notification> = data
            .notifications
            .into_iter()
            .filter(|n| n.user_id == user_id)
            .collect();
        notifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(notifications)
    }

    /// Returns `false` when the settings mute this kind of notification.
    pub fn add_notification(
        &self,
        user_id: &str,
        kind: NotificationType,
        title: &str,
        message: &str,
    ) -> Result<bool> {
        let settings = self.notification_settings()?;
        self.update(|data| {
            Ok(push_notification(
                data,
                &settings,
                user_id,
                kind,
                title,
                message,
                Utc::now(),
            ))
        })
    }

    pub fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<()> {
        self.update(|data| {
            let note = data
                .notifications
                .iter_mut()
                .find(|n| n.id == id && n.user_id == user_id)
                .ok_or_else(|| PortalError::not_found("Notification", id))?;
            note.read = true;
            Ok(())
        })
    }

    pub fn mark_all_read(&self, user_id: &str) -> Result<usize> {
        self.update(|data| {
            let mut changed = 0;
            for note in data
                .notifications
                .iter_mut()
                .filter(|n| n.user_id == user_id && !n.read)
            {
                note.read = true;
                changed += 1;
            }
            Ok(changed)
        })
    }

    pub fn unread_notification_count(&self, user_id: &str) -> Result<usize> {
        Ok(unread_count(&self.get_data()?, user_id))
    }

    pub fn delete_notification(&self, id: &str, user_id: &str) -> Result<()> {
        self.update(|data| {
            let before = data.notifications.len();
            data.notifications
                .retain(|n| !(n.id == id && n.user_id == user_id));
            if data.notifications.len() == before {
                return Err(PortalError::not_found("Notification", id));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_notifications_injects_welcome_once() {
        let store = Store::in_memory();
        let first = store.get_notifications("1").unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].title, "Complete your profile");

        let second = store.get_notifications("1").unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_get_notifications_keeps_existing() {
        let store = Store::in_memory();
        let notes = store.get_notifications("2").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationType::Interview);
    }

    #[test]
    fn test_mark_read_and_counts() {
        let store = Store::in_memory();
        let notes = store.get_notifications("4").unwrap();
        assert_eq!(store.unread_notification_count("4").unwrap(), 2);

        store.mark_notification_read(&notes[0].id, "4").unwrap();
        assert_eq!(store.unread_notification_count("4").unwrap(), 1);
        assert!(store.mark_notification_read(&notes[1].id, "2").is_err());

        assert_eq!(store.mark_all_read("4").unwrap(), 1);
        assert_eq!(store.unread_notification_count("4").unwrap(), 0);
    }

    #[test]
    fn test_muted_kinds_are_not_delivered() {
        let store = Store::in_memory();
        let mut settings = store.notification_settings().unwrap();
        assert_eq!(settings, NotificationSettings::default());
        settings.set("messages", false).unwrap();
        store.save_notification_settings(&settings).unwrap();

        assert!(!store
            .add_notification("3", NotificationType::Message, "Hi", "muted")
            .unwrap());
        assert!(store
            .add_notification("3", NotificationType::Job, "New job", "delivered")
            .unwrap());
        let count = store
            .get_data()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| n.user_id == "3")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_delete_notification() {
        let store = Store::in_memory();
        let notes = store.get_notifications("2").unwrap();
        store.delete_notification(&notes[0].id, "2").unwrap();
        assert!(store.delete_notification(&notes[0].id, "2").is_err());
    }
}
