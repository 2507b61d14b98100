// Seek 엔진 - 원하는 프레임 번호에 정확히 도착시키기
// 아키텍처: 연속 디코딩 / forward 탐색 / backward 탐색 3가지 경로
//
// 탐색 경로는 두 단계:
// 1) 키프레임 확보: 목표에서 시작해 KEYFRAME_SEARCH_STEP씩 뒤로 물러나며 컨테이너 seek,
//    한 프레임 디코딩한 결과가 목표 이하가 될 때까지 반복
// 2) 전진 채우기: 목표에 도달할 때까지 한 프레임씩 디코딩하며 전부 캐시
//
// 주의: 1단계 프레임 캐시는 방향마다 다르다. backward는 캐시하고 forward는 버린다.

use super::session::Session;
use super::source::{Converter, Decoder};
use crate::error::PlayerError;

/// 키프레임 탐색 시 한 번에 물러나는 프레임 수
pub const KEYFRAME_SEARCH_STEP: i64 = 30;

/// 탐색 중 읽기 실패 재시도 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// 성공할 때까지 즉시 재시도 (망가진 스트림에서는 멈출 수 있음)
    #[default]
    Unbounded,
    /// 최대 n회 재시도 후 에러
    Limited(u32),
}

/// 요청 하나에 대해 선택된 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekStrategy {
    Consecutive,
    Forward,
    Backward,
}

impl SeekStrategy {
    /// current+1 → 연속, current보다 뒤 → forward, 그 외 → backward
    /// (desired == current도 backward: 다시 찾아가며 캐시에 넣는다)
    pub fn classify(current: i64, desired: i64) -> Self {
        if desired == current + 1 {
            SeekStrategy::Consecutive
        } else if desired > current {
            SeekStrategy::Forward
        } else {
            SeekStrategy::Backward
        }
    }

    /// 키프레임 확보 단계에서 디코딩한 프레임도 캐시하는지
    pub fn caches_keyframe_scan(self) -> bool {
        matches!(self, SeekStrategy::Backward)
    }
}

/// seek 한 번의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekOutcome {
    pub strategy: SeekStrategy,
    pub desired: i64,
    /// 실제로 도착한 프레임 (보통 desired와 같음)
    pub landed: i64,
    pub reads: u64,
    pub container_seeks: u64,
}

/// Seek 엔진 (상태 없음, 정책만 보관)
#[derive(Debug, Clone, Copy)]
pub struct SeekEngine {
    keyframe_step: i64,
    retry: RetryPolicy,
}

impl Default for SeekEngine {
    fn default() -> Self {
        Self::new(KEYFRAME_SEARCH_STEP, RetryPolicy::Unbounded)
    }
}

impl SeekEngine {
    pub fn new(keyframe_step: i64, retry: RetryPolicy) -> Self {
        Self {
            keyframe_step: keyframe_step.max(1),
            retry,
        }
    }

    pub fn keyframe_step(&self) -> i64 {
        self.keyframe_step
    }

    /// 디코더를 `desired` 프레임으로 이동
    /// - 지나가며 디코딩한 프레임은 캐시 (forward 1단계 제외)
    /// - 도착 위치는 session.decoder_position에 기록
    pub fn seek_to<D, C>(
        &self,
        session: &mut Session<D, C>,
        desired: i64,
    ) -> Result<SeekOutcome, PlayerError>
    where
        D: Decoder,
        C: Converter<D::Raw>,
    {
        let (reads_before, seeks_before) = session.io_counters();
        let strategy = SeekStrategy::classify(session.decoder_position, desired);

        let landed = match strategy {
            SeekStrategy::Consecutive => self.decode_consecutive(session, desired)?,
            SeekStrategy::Forward | SeekStrategy::Backward => {
                if !session.time_base.is_established() {
                    // pts 기준점이 없으면 seek 목표를 계산할 수 없음 → 첫 프레임부터 읽기
                    log::debug!("establishing time base before {:?} seek", strategy);
                    self.decode_consecutive(session, desired)?;
                }
                log::debug!("SEEK {:?}: {} -> {}", strategy, session.decoder_position, desired);
                self.search(session, desired, strategy.caches_keyframe_scan())?
            }
        };
        session.decoder_position = landed;

        let (reads_after, seeks_after) = session.io_counters();
        Ok(SeekOutcome {
            strategy,
            desired,
            landed,
            reads: reads_after - reads_before,
            container_seeks: seeks_after - seeks_before,
        })
    }

    /// 다음 프레임 하나 디코딩. 여기서의 읽기 실패는 치명적 (재시도 없음)
    fn decode_consecutive<D, C>(
        &self,
        session: &mut Session<D, C>,
        desired: i64,
    ) -> Result<i64, PlayerError>
    where
        D: Decoder,
        C: Converter<D::Raw>,
    {
        let (pts, duration, is_key) = session.read_frame()?;

        if !session.time_base.is_established() {
            session.time_base.establish(pts, duration)?;
        }

        let frame_index = session.time_base.pts_to_frame(pts);
        session.cache_current_frame(frame_index)?;
        session.decoder_position = frame_index;

        if is_key {
            log::debug!("[KEY] CONSECUTIVE: f {}, f_des {} @ {}", frame_index, desired, pts);
        }

        Ok(frame_index)
    }

    /// 키프레임 확보 + 전진 채우기
    fn search<D, C>(
        &self,
        session: &mut Session<D, C>,
        desired: i64,
        cache_scan: bool,
    ) -> Result<i64, PlayerError>
    where
        D: Decoder,
        C: Converter<D::Raw>,
    {
        let mut seek_target = desired;
        let mut last_seek_target = session.decoder_position;
        let mut seek_result = desired + 1;
        let mut tried_zero = false;

        // 1단계: desired 이하 프레임이 나올 때까지 뒤로 물러나며 seek
        while seek_result > desired {
            if seek_target < 0 {
                seek_target = 0;
                if tried_zero {
                    log::error!("seek search hit frame 0 twice looking for {}", desired);
                    return Err(PlayerError::SeekExhausted { desired });
                }
                tried_zero = true;
            }

            let backward = last_seek_target > seek_target;
            let target_pts = session.time_base.frame_to_pts(seek_target);
            if let Err(e) = session.seek_container(target_pts, backward) {
                log::warn!("container seek to frame {} failed: {}", seek_target, e);
            }

            seek_result = self.read_retrying(session)?;
            if cache_scan {
                session.cache_current_frame(seek_result)?;
            }
            crate::debug_log!("  target: {} (last {}) result: {}", seek_target, last_seek_target, seek_result);

            last_seek_target = seek_target;
            seek_target -= self.keyframe_step;
        }

        // 2단계: 목표까지 한 프레임씩 전진
        while seek_result < desired {
            seek_result = self.read_retrying(session)?;
            session.cache_current_frame(seek_result)?;
        }

        Ok(seek_result)
    }

    /// 탐색 중 읽기 (실패는 일시적으로 보고 즉시 재시도, 파일 끝은 재시도하지 않음)
    fn read_retrying<D, C>(&self, session: &mut Session<D, C>) -> Result<i64, PlayerError>
    where
        D: Decoder,
        C: Converter<D::Raw>,
    {
        let mut failures: u32 = 0;
        loop {
            match session.read_frame() {
                Ok((pts, _, _)) => return Ok(session.time_base.pts_to_frame(pts)),
                Err(e) if e.is_end_of_stream() => return Err(e),
                Err(e) => {
                    failures += 1;
                    if let RetryPolicy::Limited(max_retries) = self.retry {
                        if failures > max_retries {
                            return Err(PlayerError::RetriesExhausted {
                                attempts: failures,
                                last: Box::new(e),
                            });
                        }
                    }
                    crate::debug_log!("couldn't read frame ({}), retry #{}", e, failures);
                }
            }
        }
    }
}
