// 推荐预计算任务入口
//
// 无参数命令：完整跑一次预计算并打印进度，成功退出码为 0，
// 只有 Load 阶段的致命失败才以非零码退出

use std::sync::Arc;

use media_discovery_backend::database::Database;
use media_discovery_backend::services::RecommendationPrecomputer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    println!("Starting recommendation precompute job...");

    let database = Database::new().await?;
    let job = RecommendationPrecomputer::new(Arc::new(database.repository().clone()));
    let report = job.run().await?;

    println!("Entries written this run: {}", report.entries_written);
    println!("Cache now holds {} keys:", report.cache_keys.len());
    for key in &report.cache_keys {
        println!("  {}", key);
    }
    println!("Precompute job finished.");

    Ok(())
}
