use chrono::Local;

pub const DEFAULT_TARGET: &str = "Poke";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Debug,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERRO",
            Level::Debug => "DEBG",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Level::Info => "\x1b[32m",
            Level::Warn => "\x1b[33m",
            Level::Error => "\x1b[31m",
            Level::Debug => "\x1b[34m",
        }
    }
}

/// 统一日志输出
/// 格式: [Time] [LEVEL] [Target] Message
///
/// WARN / ERRO 走 stderr，避免混进宿主的标准输出。
pub fn print(level: Level, target: &str, args: std::fmt::Arguments) {
    const GRAY: &str = "\x1b[90m";
    const CYAN: &str = "\x1b[36m";
    const RESET: &str = "\x1b[0m";

    let now = Local::now().format("%H:%M:%S");
    let line = format!(
        "{GRAY}[{now}] {}[{}]{RESET} {CYAN}[{target}]{RESET} {args}",
        level.color(),
        level.tag(),
    );

    match level {
        Level::Warn | Level::Error => eprintln!("{line}"),
        Level::Info | Level::Debug => println!("{line}"),
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __poke_log {
    ($level:ident, target: $target:expr, $($arg:tt)+) => (
        $crate::log::print($crate::log::Level::$level, $target, format_args!($($arg)+))
    );
    ($level:ident, $($arg:tt)+) => (
        $crate::log::print($crate::log::Level::$level, $crate::log::DEFAULT_TARGET, format_args!($($arg)+))
    );
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => ($crate::__poke_log!(Info, $($arg)+));
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => ($crate::__poke_log!(Warn, $($arg)+));
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => ($crate::__poke_log!(Error, $($arg)+));
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => ($crate::__poke_log!(Debug, $($arg)+));
}
