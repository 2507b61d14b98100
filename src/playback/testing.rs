// 테스트용 스크립트 디코더 - 키프레임 간격, 읽기 실패 주입, seek 기록

use std::collections::VecDeque;

use super::cache::{FrameCache, ENTRY_OVERHEAD_BYTES};
use super::session::Session;
use super::source::{Converter, DecodedFrame, Decoder, StreamInfo};
use crate::error::PlayerError;

/// 프레임 번호를 그대로 원본 프레임으로 돌려주는 가짜 디코더
pub struct ScriptedDecoder {
    info: StreamInfo,
    frame_count: i64,
    keyframe_interval: i64,
    position: i64,
    injected_failures: VecDeque<PlayerError>,
    failures_after_seek: usize,
    broken_seek: bool,
    pub seek_log: Vec<(i64, bool)>,
}

impl ScriptedDecoder {
    pub const ZERO_PTS: i64 = 1000;
    pub const DURATION: i64 = 40;

    pub fn new(frame_count: i64, keyframe_interval: i64) -> Self {
        Self {
            info: StreamInfo {
                width: 4,
                height: 4,
                time_base_num: 1,
                time_base_den: 1000,
                frame_rate: Some((25, 1)),
            },
            frame_count,
            keyframe_interval,
            position: 0,
            injected_failures: VecDeque::new(),
            failures_after_seek: 0,
            broken_seek: false,
            seek_log: Vec::new(),
        }
    }

    /// 다음 n번의 읽기를 실패시킴
    pub fn fail_next_reads(mut self, n: usize) -> Self {
        for _ in 0..n {
            self.injected_failures
                .push_back(PlayerError::Decode("injected read failure".into()));
        }
        self
    }

    /// 다음 seek 직후 n번의 읽기를 실패시킴
    pub fn fail_after_seek(mut self, n: usize) -> Self {
        self.failures_after_seek = n;
        self
    }

    /// 어디로 seek하든 마지막 프레임으로 가버리는 손상된 스트림
    pub fn with_broken_seek(mut self) -> Self {
        self.broken_seek = true;
        self
    }

    pub fn pts_of(frame: i64) -> i64 {
        Self::ZERO_PTS + frame * Self::DURATION
    }

    fn last_keyframe(&self) -> i64 {
        ((self.frame_count - 1) / self.keyframe_interval) * self.keyframe_interval
    }
}

impl Decoder for ScriptedDecoder {
    type Raw = i64;

    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn read_next_video_frame(&mut self) -> Result<DecodedFrame<i64>, PlayerError> {
        if let Some(err) = self.injected_failures.pop_front() {
            return Err(err);
        }
        if self.position >= self.frame_count {
            return Err(PlayerError::EndOfStream);
        }

        let frame = self.position;
        self.position += 1;
        Ok(DecodedFrame {
            pts: Self::pts_of(frame),
            duration_hint: Self::DURATION,
            is_key: frame % self.keyframe_interval == 0,
            raw: frame,
        })
    }

    fn seek(&mut self, pts: i64, backward: bool) -> Result<(), PlayerError> {
        self.seek_log.push((pts, backward));
        let armed = std::mem::take(&mut self.failures_after_seek);
        for _ in 0..armed {
            self.injected_failures
                .push_back(PlayerError::Decode("injected read failure".into()));
        }
        if self.broken_seek {
            self.position = self.frame_count - 1;
            return Ok(());
        }

        let target = ((pts - Self::ZERO_PTS) / Self::DURATION).clamp(0, self.frame_count - 1);
        let k = self.keyframe_interval;
        let keyframe = if backward {
            (target / k) * k
        } else {
            // 가장 가까운 키프레임
            ((target + k / 2) / k) * k
        };
        self.position = keyframe.min(self.last_keyframe());
        Ok(())
    }
}

/// 원본 프레임 번호로 버퍼를 채우는 변환기
pub struct FillConverter;

impl Converter<i64> for FillConverter {
    fn convert(&mut self, raw: &i64, out: &mut [u8]) -> Result<(), PlayerError> {
        out.fill(*raw as u8);
        Ok(())
    }
}

/// `cache_entries`장의 프레임이 정확히 들어가는 캐시를 가진 세션
pub fn session_with(
    decoder: ScriptedDecoder,
    cache_entries: u64,
) -> Session<ScriptedDecoder, FillConverter> {
    let entry_bytes = decoder.info().frame_data_size() as u64 + ENTRY_OVERHEAD_BYTES;
    Session::new(decoder, FillConverter, FrameCache::new(entry_bytes * cache_entries))
}
