use std::sync::Once;

static INIT: Once = Once::new();

/// 统一测试环境初始化：日志（tracing）
pub fn init_test_env() {
    INIT.call_once(|| {
        // 简化：若用户未设置 RUST_LOG，则提供一个默认级别。
        if std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", "warn");
        }
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests_env_smoke {
    #[test]
    fn init_env_smoke() {
        // 多次调用应只初始化一次（幂等）
        super::init_test_env();
        super::init_test_env();
    }
}
