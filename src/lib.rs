// Frame Player 엔진
// 프레임 단위 탐색이 가능한 비디오 재생기 (ffmpeg-next 기반)

/// 디버그 로그 매크로: `cargo build --features debug_log` 시에만 출력
/// 평소 릴리스 빌드에서는 컴파일 자체에서 제외됨
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "debug_log")]
        log::trace!($($arg)*);
    };
}

pub mod error;
pub mod ffmpeg;
pub mod playback;
pub mod display;

pub use error::PlayerError;
pub use playback::{
    FrameCache, PlaybackController, PlaybackMode, PlayerConfig, SeekEngine, Session, TimeBase,
};
