// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=field_mgmt=trace
///
/// # 示例
/// ```no_run
/// use field_mgmt::logging;
/// logging::init();
/// ```
pub fn init() {
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 初始化 JSON 结构化日志（导入 span 中的 batch_id 作为字段输出）
pub fn init_json() {
    let _ = fmt()
        .json()
        .with_env_filter(env_filter())
        .with_current_span(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
