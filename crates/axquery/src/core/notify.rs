/*!
Blocking notification waits.

The service may deliver notifications on any thread. Deliveries are queued
and the waiting thread wraps each delivered node and evaluates the caller's
predicate, so predicates never run inside a service callback.
*/

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::Element;
use crate::a11y::canonical_notification;
use crate::platform::NodeService;
use crate::types::{AxError, AxResult};

/// A notification accepted by a wait.
pub struct Notified<S: NodeService> {
  /// The node the notification was delivered for.
  pub element: Element<S>,
  /// Canonical notification identifier.
  pub notification: String,
}

impl<S: NodeService> fmt::Debug for Notified<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Notified")
      .field("element", &self.element)
      .field("notification", &self.notification)
      .finish()
  }
}

struct Mailbox<H> {
  queue: Mutex<VecDeque<(H, String)>>,
  ready: Condvar,
}

impl<S: NodeService> Element<S> {
  /// Block until `name` fires on this element and `predicate` accepts the
  /// delivered element and notification identifier, or until `timeout`
  /// elapses. A timeout too large to represent waits without a deadline.
  ///
  /// The subscription is released before returning.
  pub fn wait_for_notification<F>(
    &self,
    name: &str,
    timeout: Duration,
    mut predicate: F,
  ) -> AxResult<Notified<S>>
  where
    F: FnMut(&Element<S>, &str) -> bool,
  {
    let notification = canonical_notification(name).into_owned();
    let mailbox: Arc<Mailbox<S::Handle>> = Arc::new(Mailbox {
      queue: Mutex::new(VecDeque::new()),
      ready: Condvar::new(),
    });

    let sink = Arc::clone(&mailbox);
    let subscription = self.service().register_notification(
      self.handle(),
      &notification,
      Box::new(move |handle: S::Handle, id: &str| {
        sink.queue.lock().push_back((handle, id.to_owned()));
        sink.ready.notify_all();
      }),
    )?;
    log::debug!("Waiting up to {timeout:?} for {notification} on {}", self.class());

    let deadline = Instant::now().checked_add(timeout);
    loop {
      let batch: Option<Vec<_>> = {
        let mut queue = mailbox.queue.lock();
        let expired = match deadline {
          _ if !queue.is_empty() => false,
          Some(deadline) => {
            mailbox.ready.wait_until(&mut queue, deadline).timed_out() && queue.is_empty()
          }
          None => {
            mailbox.ready.wait(&mut queue);
            false
          }
        };
        (!expired).then(|| queue.drain(..).collect())
      };
      let Some(batch) = batch else {
        drop(subscription);
        return Err(AxError::NotificationTimeout {
          notification,
          timeout,
        });
      };

      for (handle, id) in batch {
        let element = match self.adopt(handle) {
          Ok(element) => element,
          Err(err) => {
            log::debug!("Ignoring {id} for an unwrappable element: {err}");
            continue;
          }
        };
        if predicate(&element, &id) {
          drop(subscription);
          return Ok(Notified {
            element,
            notification: id,
          });
        }
      }
    }
  }

  /// Wait for the first delivery of `name`, using the session's default timeout.
  pub fn wait_for(&self, name: &str) -> AxResult<Notified<S>> {
    let timeout = self.config().notification_timeout();
    self.wait_for_notification(name, timeout, |_, _| true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::{fixtures, AxQuery};
  use crate::platform::memory::{MemHandle, MemoryTree};
  use std::thread::{self, JoinHandle};

  /// Post `(subject, name)` on `target` once a waiter has subscribed.
  fn post_when_subscribed(
    ax: &AxQuery<MemoryTree>,
    target: MemHandle,
    deliveries: Vec<(&'static str, MemHandle)>,
  ) -> JoinHandle<()> {
    let poster = ax.clone();
    thread::spawn(move || {
      let start = Instant::now();
      while poster.service().subscription_count() == 0 {
        if start.elapsed() > Duration::from_secs(5) {
          return;
        }
        thread::yield_now();
      }
      for (name, subject) in deliveries {
        poster.service().post_for(target, name, subject);
      }
    })
  }

  #[test]
  fn delivery_from_another_thread() {
    let (ax, nodes) = fixtures::tree();
    let window = ax.element(nodes.window).expect("window");
    let poster = post_when_subscribed(&ax, nodes.window, vec![("AXMoved", nodes.window)]);
    let notified = window
      .wait_for_notification("moved", Duration::from_secs(5), |_, _| true)
      .expect("notification");
    poster.join().expect("poster thread");
    assert_eq!(notified.notification, "AXMoved");
    assert_eq!(notified.element, window);
    assert_eq!(ax.service().subscription_count(), 0);
  }

  #[test]
  fn predicate_filters_deliveries() {
    let (ax, nodes) = fixtures::tree();
    let window = ax.element(nodes.window).expect("window");
    let poster = post_when_subscribed(
      &ax,
      nodes.window,
      vec![("AXCreated", nodes.c1a), ("AXCreated", nodes.c1b)],
    );
    let notified = window
      .wait_for_notification("created", Duration::from_secs(5), |e, _| {
        e.class().name() == "CheckBox"
      })
      .expect("notification");
    poster.join().expect("poster thread");
    assert_eq!(notified.element.handle(), &nodes.c1b);
  }

  #[test]
  fn predicate_sees_the_delivered_name() {
    let (ax, nodes) = fixtures::tree();
    let window = ax.element(nodes.window).expect("window");
    let poster = post_when_subscribed(&ax, nodes.window, vec![("AXMoved", nodes.window)]);
    let mut seen = Vec::new();
    let notified = window
      .wait_for_notification("moved", Duration::from_secs(5), |_, name| {
        seen.push(name.to_owned());
        name == "AXMoved"
      })
      .expect("notification");
    poster.join().expect("poster thread");
    assert_eq!(seen, vec!["AXMoved"]);
    assert_eq!(notified.notification, "AXMoved");
  }

  #[test]
  fn unbounded_timeout_waits_for_delivery() {
    let (ax, nodes) = fixtures::tree();
    let window = ax.element(nodes.window).expect("window");
    let poster = post_when_subscribed(&ax, nodes.window, vec![("AXResized", nodes.window)]);
    let notified = window
      .wait_for_notification("resized", Duration::MAX, |_, _| true)
      .expect("notification");
    poster.join().expect("poster thread");
    assert_eq!(notified.notification, "AXResized");
    assert_eq!(ax.service().subscription_count(), 0);
  }

  #[test]
  fn times_out_and_unsubscribes() {
    let (ax, nodes) = fixtures::tree();
    let window = ax.element(nodes.window).expect("window");
    let err = window
      .wait_for_notification("value_changed", Duration::from_millis(20), |_, _| true)
      .expect_err("nothing posted");
    assert!(matches!(
      err,
      AxError::NotificationTimeout { ref notification, .. } if notification == "AXValueChanged"
    ));
    assert_eq!(ax.service().subscription_count(), 0);
  }

  #[test]
  fn declined_deliveries_still_time_out() {
    let (ax, nodes) = fixtures::tree();
    let window = ax.element(nodes.window).expect("window");
    let poster = post_when_subscribed(&ax, nodes.window, vec![("AXTitleChanged", nodes.window)]);
    let result =
      window.wait_for_notification("title_changed", Duration::from_millis(200), |_, _| false);
    poster.join().expect("poster thread");
    assert!(matches!(result, Err(AxError::NotificationTimeout { .. })));
  }

  #[test]
  fn literal_names_pass_through() {
    let (ax, nodes) = fixtures::tree();
    let window = ax.element(nodes.window).expect("window");
    let poster = post_when_subscribed(&ax, nodes.window, vec![("MyAppDidSync", nodes.window)]);
    let notified = window.wait_for("MyAppDidSync").expect("custom notification");
    poster.join().expect("poster thread");
    assert_eq!(notified.notification, "MyAppDidSync");
  }
}
