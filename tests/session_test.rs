use blobmutx::queue::MemoryBroker;
use blobmutx::store::MemoryStore;
use blobmutx::{AcquireOptions, InstanceId, LockSettings, Session};
use std::sync::Arc;

#[tokio::test]
async fn test_session_guards_read_modify_write() {
    let store = Arc::new(MemoryStore::new());
    let broker = Arc::new(MemoryBroker::new());

    let mut sessions = Vec::new();
    for host in ["host-a", "host-b", "host-c"] {
        let identity = InstanceId::derive(host, std::path::Path::new("/opt/app"));
        let session = Session::with_backends(
            store.clone(),
            broker.clone(),
            identity,
            LockSettings::default(),
        )
        .await
        .unwrap();
        sessions.push(Arc::new(session));
    }

    let mut tasks = Vec::new();
    for session in sessions {
        tasks.push(tokio::spawn(async move {
            for _ in 0..4 {
                let fs = session.fs.clone();
                session
                    .lock
                    .with_lock(AcquireOptions::default(), move || async move {
                        let current = match fs.read_file("/counter").await {
                            Ok(bytes) => String::from_utf8(bytes).unwrap().parse::<u32>().unwrap(),
                            Err(e) if e.is_not_found() => 0,
                            Err(e) => panic!("read failed: {}", e),
                        };
                        tokio::task::yield_now().await;
                        fs.write_file("/counter", (current + 1).to_string().as_bytes())
                            .await
                            .unwrap();
                    })
                    .await
                    .unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let fs = blobmutx::VirtualFs::new(store);
    assert_eq!(fs.read_file("/counter").await.unwrap(), b"12");
}
