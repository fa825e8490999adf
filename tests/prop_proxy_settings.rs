//! Property-based tests for port selection and bypass-list derivation.
use proptest::prelude::*;
use clash_switchboard_lib::core::controller::ClashConfig;
use clash_switchboard_lib::core::proxy::{
    default_bypass_list, effective_bypass_list, get_proxy_port, select_proxy_port,
    FALLBACK_PROXY_PORT,
};

fn host_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("127.0.0.1".to_string()),
        Just("LOCALHOST".to_string()),
        "[a-z]{1,8}\\.lan",
        (1u8..255, 0u8..255).prop_map(|(a, b)| format!("10.0.{a}.{b}")),
    ]
}

proptest! {
    #[test]
    fn port_follows_priority(mixed in 0u16..3, port in 0u16..3, socks in 0u16..3) {
        // 0 means unset; pick small values so every combination of set/unset shows up
        let cfg = ClashConfig { mixed_port: mixed * 7000, port: port * 7100, socks_port: socks * 7200, ..Default::default() };
        let chosen = get_proxy_port(&cfg);
        let expected = if mixed > 0 {
            mixed * 7000
        } else if port > 0 {
            port * 7100
        } else if socks > 0 {
            socks * 7200
        } else {
            FALLBACK_PROXY_PORT
        };
        prop_assert_eq!(chosen, expected);
        prop_assert!(chosen > 0);
    }

    #[test]
    fn custom_fallback_only_when_all_unset(fallback in 1u16..u16::MAX) {
        let cfg = ClashConfig::default();
        prop_assert_eq!(select_proxy_port(&cfg, fallback), fallback);
        let cfg = ClashConfig { socks_port: 1080, ..Default::default() };
        prop_assert_eq!(select_proxy_port(&cfg, fallback), 1080);
    }

    #[test]
    fn bypass_always_contains_host_once(
        configured in proptest::option::of(proptest::collection::vec("[a-z*.<>]{1,10}", 0..5)),
        host in host_strategy(),
    ) {
        let list = effective_bypass_list(configured.as_deref(), &host);
        let matches = list.iter().filter(|h| h.eq_ignore_ascii_case(&host)).count();
        prop_assert!(matches >= 1, "host {} missing from {:?}", host, list);

        match configured.as_deref() {
            Some(c) if !c.is_empty() => prop_assert_eq!(&list[..c.len()], c),
            _ => prop_assert_eq!(&list[..4], &default_bypass_list()[..]),
        }
        // 追加的 host 不会重复
        let again = effective_bypass_list(Some(&list), &host);
        prop_assert_eq!(again, list);
    }
}
