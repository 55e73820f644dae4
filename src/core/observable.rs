use std::sync::Arc;
use tokio::sync::watch;

/// Value holder with `set` and `subscribe`, the state container behind the
/// score store readiness signal, the favorites view and the session gate.
///
/// Cloning shares the same underlying value.
#[derive(Debug)]
pub struct Observable<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T: Clone> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// 整體替換，不論是否有訂閱者
    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Replace in place when `modify` returns true; subscribers are only
    /// notified in that case. The check and the write happen under one lock.
    pub fn update_if(&self, modify: impl FnOnce(&mut T) -> bool) -> bool {
        self.sender.send_if_modified(modify)
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let value = Observable::new(1);
        value.set(2);
        assert_eq!(value.get(), 2);

        let shared = value.clone();
        shared.set(3);
        assert_eq!(value.get(), 3);
    }

    #[tokio::test]
    async fn test_subscriber_sees_latest_value() {
        let value = Observable::new(String::from("loading"));
        let mut rx = value.subscribe();

        value.set("first".to_string());
        value.set("second".to_string());

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "second");
    }

    #[test]
    fn test_update_if_skips_unmodified() {
        let value = Observable::new(10);
        let mut rx = value.subscribe();

        assert!(!value.update_if(|v| {
            if *v > 100 {
                *v = 0;
                true
            } else {
                false
            }
        }));
        assert!(!rx.has_changed().unwrap());

        assert!(value.update_if(|v| {
            *v += 1;
            true
        }));
        assert!(rx.has_changed().unwrap());
        assert_eq!(value.get(), 11);
    }
}
