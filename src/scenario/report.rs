use tracing::{info, warn};

/// 逐条记录检查结果，并负责控制台输出。
#[derive(Debug, Default)]
pub struct Report {
    passed: usize,
    failed: Vec<String>,
}

impl Report {
    pub fn pass(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        self.passed += 1;
        println!("✅ - {message}");
        info!(target: "scenario", check = message, "检查通过");
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        eprintln!("❌ - {message}");
        warn!(target: "scenario", check = %message, "检查失败");
        self.failed.push(message);
    }

    /// 按条件记录通过或失败。
    pub fn check(&mut self, ok: bool, pass: impl AsRef<str>, fail: impl Into<String>) {
        if ok {
            self.pass(pass);
        } else {
            self.fail(fail);
        }
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn all_passed(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn print_summary(&self) {
        info!(
            target: "scenario",
            passed = self.passed,
            failed = self.failed.len(),
            "场景执行完毕"
        );
        println!(
            "📋 - {} passed, {} failed",
            self.passed,
            self.failed.len()
        );
    }
}
