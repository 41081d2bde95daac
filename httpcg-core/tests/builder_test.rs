// Builder behavior through the public API

use httpcg_core::builder::{
    DEFAULT_CONNECTION_TIMEOUT, DEFAULT_EXPECT_CONTINUE_TIMEOUT, DEFAULT_IDLE_CONN_TIMEOUT,
    DEFAULT_KEEP_ALIVE, DEFAULT_RESPONSE_HEADER_TIMEOUT, DEFAULT_TLS_HANDSHAKE_TIMEOUT,
};
use httpcg_core::proxy::DirectProxyResolver;
use httpcg_core::ClientBuilder;
use pretty_assertions::assert_eq;
use reqwest::cookie::CookieStore;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use url::Url;

#[test]
fn test_default_build_uses_default_transport() {
    let client = ClientBuilder::new().build().expect("default build should succeed");
    let t = client.transport();

    assert_eq!(t.dialer.timeout, Duration::from_secs(5));
    assert_eq!(t.dialer.keep_alive, Duration::from_secs(30));
    assert_eq!(t.expect_continue_timeout, Duration::from_secs(1));
    assert_eq!(t.idle_conn_timeout, Duration::from_secs(90));
    assert_eq!(t.response_header_timeout, Duration::from_secs(5));
    assert_eq!(t.tls_handshake_timeout, Duration::from_secs(5));
    assert_eq!(t.max_idle_connections, 100);
    assert_eq!(t.max_idle_connections_per_host, 10);
    assert!(!t.force_attempt_http2);
    assert!(t.alpn_protocols.is_empty());
    assert!(!client.http2_enabled());
    assert!(!client.has_cookie_jar());
}

#[test]
fn test_http2_build_negotiates_h2() {
    let client = ClientBuilder::new().with_http2().build().unwrap();

    assert!(client.http2_enabled());
    assert!(client.transport().force_attempt_http2);
    assert_eq!(client.transport().alpn_protocols, vec!["h2", "http/1.1"]);
    assert!(!client.has_cookie_jar());
}

#[test]
fn test_cookies_build_attaches_empty_jar() {
    let client = ClientBuilder::new().with_cookies().build().unwrap();

    let jar = client.cookie_jar().expect("cookie jar should be attached");
    let url = Url::parse("https://example.com/").unwrap();
    assert!(jar.cookies(&url).is_none());
    assert!(!client.http2_enabled());
}

#[test]
fn test_independent_fields_keep_last_value() {
    let client = ClientBuilder::new()
        .with_connection_timeout(Duration::from_secs(2))
        .with_tls_handshake_timeout(Duration::from_secs(10))
        .with_idle_conn_timeout(Duration::from_secs(30))
        .with_expect_continue_timeout(Duration::from_millis(500))
        .with_keep_alive(Duration::from_secs(15))
        .with_response_header_timeout(Duration::from_secs(8))
        .with_idle_conn_timeout(Duration::from_secs(45))
        .build()
        .unwrap();
    let t = client.transport();

    assert_eq!(t.dialer.timeout, Duration::from_secs(2));
    assert_eq!(t.tls_handshake_timeout, Duration::from_secs(10));
    assert_eq!(t.idle_conn_timeout, Duration::from_secs(45));
    assert_eq!(t.expect_continue_timeout, Duration::from_millis(500));
    assert_eq!(t.dialer.keep_alive, Duration::from_secs(15));
    assert_eq!(t.response_header_timeout, Duration::from_secs(8));
}

#[test]
fn test_order_of_independent_setters_is_irrelevant() {
    let a = ClientBuilder::new()
        .with_connection_timeout(Duration::from_secs(2))
        .with_tls_handshake_timeout(Duration::from_secs(10));
    let b = ClientBuilder::new()
        .with_tls_handshake_timeout(Duration::from_secs(10))
        .with_connection_timeout(Duration::from_secs(2));

    assert_eq!(a.connection_timeout(), b.connection_timeout());
    assert_eq!(a.tls_handshake_timeout(), b.tls_handshake_timeout());
}

#[test]
fn test_forked_builder_leaves_base_untouched() {
    let base = ClientBuilder::new();
    let derived = base.clone().with_connection_timeout(Duration::from_millis(250));

    let from_base = base.build().unwrap();
    let from_derived = derived.build().unwrap();

    assert_eq!(from_base.transport().dialer.timeout, DEFAULT_CONNECTION_TIMEOUT);
    assert_eq!(from_derived.transport().dialer.timeout, Duration::from_millis(250));
    // building does not consume or alter the builder
    assert_eq!(base.build().unwrap().transport().dialer.timeout, DEFAULT_CONNECTION_TIMEOUT);
}

#[test]
fn test_max_idle_connections() {
    let client = ClientBuilder::new().with_max_idle_connections(50, 5).build().unwrap();
    assert_eq!(client.transport().max_idle_connections, 50);
    assert_eq!(client.transport().max_idle_connections_per_host, 5);
}

#[test]
fn test_per_host_cap_above_total_is_accepted() {
    let client = ClientBuilder::new().with_max_idle_connections(5, 50).build().unwrap();
    assert_eq!(client.transport().max_idle_connections, 5);
    assert_eq!(client.transport().max_idle_connections_per_host, 50);
    assert!(client.transport().check_pool_limits().is_err());
}

#[test]
fn test_setters_leave_other_defaults() {
    let b = ClientBuilder::new().with_keep_alive(Duration::from_secs(1));
    assert_eq!(b.expect_continue_timeout(), DEFAULT_EXPECT_CONTINUE_TIMEOUT);

    let b = ClientBuilder::new().with_response_header_timeout(Duration::from_secs(1));
    assert_eq!(b.idle_conn_timeout(), DEFAULT_IDLE_CONN_TIMEOUT);

    let b = ClientBuilder::new().with_http2().with_cookies();
    assert_eq!(b.keep_alive(), DEFAULT_KEEP_ALIVE);
    assert_eq!(b.response_header_timeout(), DEFAULT_RESPONSE_HEADER_TIMEOUT);
    assert_eq!(b.tls_handshake_timeout(), DEFAULT_TLS_HANDSHAKE_TIMEOUT);
}

#[test]
fn test_builds_from_same_base_are_independent() {
    let base = ClientBuilder::new().with_cookies();
    let first = base.build().unwrap();
    let second = base.build().unwrap();

    let first_jar = first.cookie_jar().unwrap();
    let second_jar = second.cookie_jar().unwrap();
    assert!(!Arc::ptr_eq(first_jar, second_jar));

    let url = Url::parse("https://example.com/").unwrap();
    first_jar.add_cookie_str("token=one", &url);
    assert!(second_jar.cookies(&url).is_none());
}

#[test]
fn test_concurrent_builds_from_shared_base() {
    let base = ClientBuilder::new().with_proxy_resolver(DirectProxyResolver);

    let handles: Vec<_> = (1..=4u64)
        .map(|i| {
            let builder = base.clone().with_connection_timeout(Duration::from_secs(i));
            thread::spawn(move || builder.build().map(|c| c.transport().dialer.timeout))
        })
        .collect();

    let timeouts: Vec<Duration> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    assert_eq!(timeouts, (1..=4).map(Duration::from_secs).collect::<Vec<_>>());
    assert_eq!(base.connection_timeout(), DEFAULT_CONNECTION_TIMEOUT);
}

#[test]
fn test_custom_proxy_resolver_reaches_transport() {
    let proxy = Url::parse("http://proxy.internal:3128").unwrap();
    let client = ClientBuilder::new()
        .with_proxy_resolver(move |_: &Url| Some(proxy.clone()))
        .build()
        .unwrap();

    let target = Url::parse("https://example.com/").unwrap();
    assert_eq!(
        client.transport().proxy_for(&target).map(|u| u.to_string()),
        Some("http://proxy.internal:3128/".to_string())
    );
}

#[test]
fn test_zero_values_keep_pooling_and_keep_alive_on() {
    let client = ClientBuilder::new()
        .with_max_idle_connections(100, 0)
        .with_keep_alive(Duration::ZERO)
        .build()
        .unwrap();
    let t = client.transport();

    assert_eq!(t.max_idle_connections_per_host, 0);
    assert_eq!(t.effective_max_idle_per_host(), 2);
    assert_eq!(t.dialer.keep_alive, Duration::ZERO);
    assert_eq!(t.effective_keep_alive(), Duration::from_secs(15));
}
