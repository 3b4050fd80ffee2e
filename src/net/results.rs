//! 统计信息
//!
//! 收集全局收发与时延统计，运行结束后汇总输出。

/// 仿真统计信息
#[derive(Debug, Default)]
pub struct SimResults {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub packets_lost: u64,
    pub latencies_ms: Vec<f64>,
}

impl SimResults {
    /// 丢包率（%），以已观测到结果的包为分母。
    pub fn loss_rate_pct(&self) -> f64 {
        let observed = self.packets_received + self.packets_lost;
        if observed == 0 {
            return 0.0;
        }
        self.packets_lost as f64 / observed as f64 * 100.0
    }

    pub fn avg_latency_ms(&self) -> f64 {
        if self.latencies_ms.is_empty() {
            return 0.0;
        }
        self.latencies_ms.iter().sum::<f64>() / self.latencies_ms.len() as f64
    }

    /// 渲染结果块（CLI 与测试共用同一份文本）。
    pub fn render(&self) -> String {
        format!(
            "--- Simulation Results ---\n\
             Total Packets Sent: {}\n\
             Total Packets Received: {}\n\
             Total Packets Lost: {}\n\
             Packet Loss Rate: {:.2}%\n\
             Average Packet Latency: {:.2}ms",
            self.packets_sent,
            self.packets_received,
            self.packets_lost,
            self.loss_rate_pct(),
            self.avg_latency_ms(),
        )
    }
}
