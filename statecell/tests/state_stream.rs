//! State changes as an async stream (requires the "stream" feature)

#![cfg(feature = "stream")]

use serde_json::json;
use statecell::testing::counter_reducer;
use statecell::{action, create_store, State};
use tokio_stream::StreamExt;

#[tokio::test]
async fn test_stream_follows_dispatches() {
    let store = create_store(counter_reducer(), Some(State::leaf(10)), None).unwrap();
    let (sub, mut stream) = store.observable().into_stream().unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap(), json!(10));

    store.dispatch(action("increment")).unwrap();
    store.dispatch(json!({"type": "add", "amount": 5})).unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap(), json!(11));
    assert_eq!(stream.next().await.unwrap().unwrap(), json!(16));

    sub.unsubscribe().unwrap();
    store.dispatch(action("increment")).unwrap();
    drop(store);
    assert!(stream.next().await.is_none());
}
