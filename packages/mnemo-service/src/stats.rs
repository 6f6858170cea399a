use serde::{Deserialize, Serialize};

use crate::MemoryService;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GetStatsResponse {
	pub total_memories: u64,
	pub average_usefulness: f64,
	pub cache_size: u64,
}

impl MemoryService {
	pub async fn get_stats(&self) -> GetStatsResponse {
		let stats = self.acting.stats().await;

		GetStatsResponse {
			total_memories: stats.total_memories,
			average_usefulness: stats.average_usefulness,
			cache_size: stats.cache_size,
		}
	}
}
