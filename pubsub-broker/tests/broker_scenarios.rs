//! End-to-end broker scenarios: fan-out, empty-prefix subscriptions, refcount
//! semantics, sparse/dense trie transitions, and timeout behavior.

use std::time::{Duration, Instant};

use pubsub_broker::{Broker, BrokerError};

#[test]
fn fan_out_to_matching_subscribers_only() {
    let broker = Broker::new();
    let s1 = broker.new_subscriber().unwrap();
    s1.subscribe(b"ch1").unwrap();
    s1.subscribe(b"ch2").unwrap();

    let s2 = broker.new_subscriber().unwrap();
    s2.subscribe(b"ch1/topic1").unwrap();

    let delivered = broker.publish("ch1/topic1", "a").unwrap();
    assert_eq!(delivered, 2);
    assert_eq!(s1.get_message(0).unwrap().payload(), b"a");
    assert_eq!(s2.get_message(0).unwrap().payload(), b"a");

    let delivered = broker.publish("ch2/topic1", "b").unwrap();
    assert_eq!(delivered, 1);
    assert_eq!(s1.get_message(0).unwrap().payload(), b"b");
    assert_eq!(s2.messages_count(), 0);
}

#[test]
fn empty_prefix_subscription_matches_every_channel() {
    let broker = Broker::new();
    let sub = broker.new_subscriber().unwrap();
    sub.subscribe(b"").unwrap();

    assert_eq!(broker.publish("anything/at/all", "x").unwrap(), 1);
    assert_eq!(sub.get_message(0).unwrap().channel(), "anything/at/all");
}

#[test]
fn subscribe_and_unsubscribe_refcount_semantics() {
    let broker = Broker::new();
    let sub = broker.new_subscriber().unwrap();

    sub.subscribe(b"ch").unwrap();
    assert!(matches!(
        sub.subscribe(b"ch"),
        Err(BrokerError::AlreadySubscribed)
    ));

    sub.unsubscribe(b"ch").unwrap();
    assert!(matches!(
        sub.unsubscribe(b"ch"),
        Err(BrokerError::NotSubscribed)
    ));
}

#[test]
fn sparse_to_dense_to_sparse_delivers_correctly_throughout() {
    let broker = Broker::new();
    let sub = broker.new_subscriber().unwrap();

    for i in 0..10 {
        sub.subscribe(format!("a{i}").as_bytes()).unwrap();
    }
    for i in 0..10 {
        assert_eq!(broker.publish(&format!("a{i}"), "x").unwrap(), 1);
    }
    for _ in 0..10 {
        sub.get_message(0).unwrap();
    }

    // Drop back down past the sparse/dense demotion boundary.
    for i in 2..10 {
        sub.unsubscribe(format!("a{i}").as_bytes()).unwrap();
    }

    assert_eq!(broker.publish("a0", "x").unwrap(), 1);
    assert_eq!(broker.publish("a1", "x").unwrap(), 1);
    for i in 2..10 {
        assert_eq!(broker.publish(&format!("a{i}"), "x").unwrap(), 0);
    }
}

#[test]
fn get_message_times_out_after_at_least_the_requested_duration() {
    let broker = Broker::new();
    let sub = broker.new_subscriber().unwrap();

    let start = Instant::now();
    let err = sub.get_message(100).unwrap_err();
    assert!(matches!(err, BrokerError::Timeout));
    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[test]
fn dropping_a_subscriber_stops_future_fan_out() {
    let broker = Broker::new();
    let sub = broker.new_subscriber().unwrap();
    sub.subscribe(b"ch").unwrap();
    assert_eq!(broker.subscriber_count(), 1);

    drop(sub);
    assert_eq!(broker.subscriber_count(), 0);
    assert_eq!(broker.publish("ch", "x").unwrap(), 0);
}

#[test]
fn publish_with_no_subscribers_succeeds_with_zero_count() {
    let broker = Broker::new();
    assert_eq!(broker.publish("ch", "x").unwrap(), 0);
}

#[test]
fn default_broker_is_a_shared_singleton() {
    let default_a = pubsub_broker::default_broker();
    let default_b = pubsub_broker::default_broker();
    let before = default_a.subscriber_count();
    let sub = default_b.new_subscriber().unwrap();
    assert_eq!(default_a.subscriber_count(), before + 1);
    drop(sub);
}
