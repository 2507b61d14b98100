// 에러 타입 - 치명적/일시적 실패 구분

use thiserror::Error;

/// 재생 세션 전체에서 사용하는 에러
///
/// 탐색 중 읽기 실패는 `SeekEngine`이 재시도하고, 그 외에는 호출자에게 그대로 전파된다.
/// 전파된 에러는 모두 세션 종료 사유다.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to open {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("no video stream found")]
    NoVideoStream,

    #[error("failed to open codec: {0}")]
    Codec(String),

    #[error("end of stream")]
    EndOfStream,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("seek error: {0}")]
    Seek(String),

    #[error("pixel conversion failed: {0}")]
    Convert(String),

    /// 첫 패킷의 duration이 0 이하라 pts ↔ 프레임 변환을 만들 수 없음
    #[error("invalid stream timing: pts {pts}, duration {duration}")]
    InvalidTiming { pts: i64, duration: i64 },

    /// 프레임 0까지 두 번 내려가도 목표 이전 키프레임을 찾지 못함
    #[error("seek search exhausted at frame 0 while looking for frame {desired}")]
    SeekExhausted { desired: i64 },

    /// 재시도 한도를 넘긴 탐색 중 읽기 실패
    #[error("giving up after {attempts} failed reads: {last}")]
    RetriesExhausted { attempts: u32, last: Box<PlayerError> },

    #[error("display error: {0}")]
    Display(String),
}

impl PlayerError {
    /// 파일 끝에 도달한 정상 종료인지
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, PlayerError::EndOfStream)
    }
}
