//! 表示画像の画面上矩形の追跡
//!
//! スクロールのたびに画像要素の矩形を測り直して公開する。画像要素が
//! マウントされていなければ何も公開せず、直前の値を保持する。
//! リスナーはマウント時に登録し、`ScrollSubscription` の破棄時に必ず解除する。

use product_lens_common::ViewportRect;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tokio::sync::watch;
use tracing::debug;

/// 表示中の画像要素
pub trait ImageElement {
    /// 未マウントならNone
    fn bounding_client_rect(&self) -> Option<ViewportRect>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// スクロールイベントの発生元
pub trait ScrollHost {
    fn add_scroll_listener(&self, listener: Box<dyn FnMut()>) -> ListenerId;
    fn remove_scroll_listener(&self, id: ListenerId) -> bool;
}

type Listener = Rc<RefCell<Box<dyn FnMut()>>>;

/// 単純なスクロールイベント配信
#[derive(Default)]
pub struct ScrollDispatcher {
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_id: Cell<u64>,
}

impl ScrollDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録済みリスナーを順に呼ぶ。実行中のリスナーは再入時に飛ばす
    pub fn scroll(&self) {
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            match listener.try_borrow_mut() {
                Ok(mut listener) => (*listener)(),
                Err(_) => debug!("skipping re-entrant scroll listener"),
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl ScrollHost for ScrollDispatcher {
    fn add_scroll_listener(&self, listener: Box<dyn FnMut()>) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(listener))));
        id
    }

    fn remove_scroll_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}

pub struct ViewportTracker {
    sender: Rc<watch::Sender<Option<ViewportRect>>>,
}

impl Default for ViewportTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportTracker {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Rc::new(sender),
        }
    }

    /// 描画側の読み取り専用ハンドル
    pub fn subscribe(&self) -> watch::Receiver<Option<ViewportRect>> {
        self.sender.subscribe()
    }

    pub fn latest(&self) -> Option<ViewportRect> {
        *self.sender.borrow()
    }

    pub fn mount(
        &self,
        host: Rc<dyn ScrollHost>,
        element: Rc<dyn ImageElement>,
    ) -> ScrollSubscription {
        let sender = Rc::clone(&self.sender);
        let measured = Rc::clone(&element);
        let id = host.add_scroll_listener(Box::new(move || publish(&sender, &*measured)));
        debug!(?id, "scroll listener acquired");

        ScrollSubscription {
            host,
            id,
            element,
            sender: Rc::clone(&self.sender),
        }
    }
}

/// マウント中のスクロール購読。破棄時にリスナーを解除する
pub struct ScrollSubscription {
    host: Rc<dyn ScrollHost>,
    id: ListenerId,
    element: Rc<dyn ImageElement>,
    sender: Rc<watch::Sender<Option<ViewportRect>>>,
}

impl ScrollSubscription {
    /// スクロールを待たずに測り直す
    pub fn refresh(&self) {
        publish(&self.sender, &*self.element);
    }
}

impl Drop for ScrollSubscription {
    fn drop(&mut self) {
        self.host.remove_scroll_listener(self.id);
        debug!(id = ?self.id, "scroll listener released");
    }
}

/// 矩形が変わったときだけ通知する
fn publish(sender: &watch::Sender<Option<ViewportRect>>, element: &dyn ImageElement) {
    let Some(rect) = element.bounding_client_rect() else {
        return;
    };
    sender.send_if_modified(|current| {
        if *current == Some(rect) {
            false
        } else {
            *current = Some(rect);
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeImage {
        rect: Cell<Option<ViewportRect>>,
    }

    impl ImageElement for FakeImage {
        fn bounding_client_rect(&self) -> Option<ViewportRect> {
            self.rect.get()
        }
    }

    #[test]
    fn test_dispatcher_add_and_remove() {
        let dispatcher = ScrollDispatcher::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let id = dispatcher.add_scroll_listener(Box::new(move || counter.set(counter.get() + 1)));

        dispatcher.scroll();
        dispatcher.scroll();
        assert_eq!(hits.get(), 2);

        assert!(dispatcher.remove_scroll_listener(id));
        assert!(!dispatcher.remove_scroll_listener(id));
        dispatcher.scroll();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_reentrant_scroll_skips_running_listener() {
        let dispatcher = Rc::new(ScrollDispatcher::new());
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let inner = Rc::downgrade(&dispatcher);
        dispatcher.add_scroll_listener(Box::new(move || {
            counter.set(counter.get() + 1);
            if let Some(dispatcher) = inner.upgrade() {
                dispatcher.scroll();
            }
        }));

        dispatcher.scroll();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_refresh_measures_immediately() {
        let tracker = ViewportTracker::new();
        let host: Rc<dyn ScrollHost> = Rc::new(ScrollDispatcher::new());
        let image = Rc::new(FakeImage::default());
        image.rect.set(Some(ViewportRect::new(1.0, 2.0, 3.0, 4.0)));

        let subscription = tracker.mount(host, image);
        assert!(tracker.latest().is_none());
        subscription.refresh();
        assert_eq!(tracker.latest(), Some(ViewportRect::new(1.0, 2.0, 3.0, 4.0)));
    }

    #[test]
    fn test_identical_rect_does_not_notify() {
        let tracker = ViewportTracker::new();
        let dispatcher = Rc::new(ScrollDispatcher::new());
        let image = Rc::new(FakeImage::default());
        image.rect.set(Some(ViewportRect::new(0.0, 10.0, 100.0, 50.0)));
        let _subscription = tracker.mount(dispatcher.clone(), image);

        let mut receiver = tracker.subscribe();
        dispatcher.scroll();
        assert!(receiver.has_changed().unwrap());
        receiver.borrow_and_update();

        dispatcher.scroll();
        assert!(!receiver.has_changed().unwrap());
    }
}
