// 재생 코어 모듈
// 프레임 캐시 + 타임베이스 + seek 엔진 + 재생 컨트롤러

pub mod cache;
pub mod controller;
pub mod seek;
pub mod session;
pub mod source;
pub mod time_base;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CachedFrame, FrameCache};
pub use controller::{InputEvent, PlaybackController, PlaybackMode, TickReport};
pub use seek::{RetryPolicy, SeekEngine, SeekOutcome, SeekStrategy, KEYFRAME_SEARCH_STEP};
pub use session::Session;
pub use source::{Converter, DecodedFrame, Decoder, StreamInfo};
pub use time_base::TimeBase;

/// 캐시 크기 기본값 (MB)
pub const DEFAULT_CACHE_SIZE_MB: u64 = 2048;

/// 재생 세션 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerConfig {
    pub cache_size_mb: u64,
    pub keyframe_step: i64,
    pub retry: RetryPolicy,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            cache_size_mb: DEFAULT_CACHE_SIZE_MB,
            keyframe_step: KEYFRAME_SEARCH_STEP,
            retry: RetryPolicy::Unbounded,
        }
    }
}

impl PlayerConfig {
    pub fn frame_cache(&self) -> FrameCache {
        FrameCache::with_megabytes(self.cache_size_mb)
    }

    pub fn seek_engine(&self) -> SeekEngine {
        SeekEngine::new(self.keyframe_step, self.retry)
    }
}
