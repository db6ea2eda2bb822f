use super::*;

#[tokio::test]
async fn bind_resolves_ephemeral_port_and_publishes_it() {
    let (_listener, local) = bind("127.0.0.1:0".parse().expect("parse socket addr"))
        .await
        .expect("bind");
    assert_ne!(local.port(), 0);

    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("addr.txt");
    publish_addr(Some(&file), local).expect("publish");

    let written = std::fs::read_to_string(&file).expect("read addr file");
    assert_eq!(written.parse::<SocketAddr>().expect("parse written addr"), local);
    assert!(!dir.path().join("addr.partial").exists());
}

#[test]
fn publish_without_a_file_is_a_noop() {
    publish_addr(None, "127.0.0.1:9".parse().expect("parse socket addr")).expect("publish");
}
