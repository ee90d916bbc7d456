use crate::io::storage::Storage;
use crate::model::Notification;
use crate::store::DataStore;

const DROPDOWN_UNREAD: usize = 3;
const DROPDOWN_READ: usize = 2;

pub fn unread_count<S: Storage>(store: &DataStore<S>) -> usize {
    store.notifications().filter(|n| !n.read).count()
}

/// What the bell dropdown shows: the first three unread and the first two
/// read notifications, newest first.
pub fn dropdown<S: Storage>(store: &DataStore<S>) -> Vec<&Notification> {
    let unread = store.notifications().filter(|n| !n.read).take(DROPDOWN_UNREAD);
    let read = store.notifications().filter(|n| n.read).take(DROPDOWN_READ);
    let mut shown: Vec<&Notification> = unread.chain(read).collect();
    shown.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    shown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::MemoryStorage;
    use crate::model::config::AppConfig;
    use crate::model::{NewNotification, NotificationId, NotificationKind};
    use chrono::{DateTime, TimeZone, Utc};

    fn at_hour() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 5, 10, 0, 0).unwrap()
    }

    #[test]
    fn dropdown_caps_each_group_and_sorts_newest_first() {
        let mut store = DataStore::load(MemoryStorage::new(), &AppConfig::default())
            .unwrap()
            .with_clock(at_hour);
        for i in 0..4 {
            store
                .add_notification(NewNotification::new(
                    NotificationKind::Project,
                    format!("update {}", i),
                ))
                .unwrap();
        }
        store.mark_notification_read(NotificationId(1)).unwrap();
        store.mark_notification_read(NotificationId(3)).unwrap();
        store.mark_notification_read(NotificationId(4)).unwrap();
        assert_eq!(unread_count(&store), 3);

        let ids: Vec<NotificationId> = dropdown(&store).iter().map(|n| n.id).collect();
        assert_eq!(ids.len(), 5);
        // seeded notifications are older than everything added at 10:00
        assert_eq!(ids[3..], [NotificationId(1), NotificationId(2)]);
        assert!(!ids.contains(&NotificationId(4)));
    }
}
