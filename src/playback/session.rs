// 재생 세션 컨텍스트
// 디코더 위치, 타임베이스, 캐시, 화면 버퍼를 한 곳에 모음 (숨은 전역 상태 없음)

use super::cache::FrameCache;
use super::source::{Converter, DecodedFrame, Decoder, StreamInfo};
use super::time_base::TimeBase;
use crate::error::PlayerError;

/// 세션 하나 = 파일 하나
pub struct Session<D: Decoder, C: Converter<D::Raw>> {
    decoder: D,
    converter: C,
    pub cache: FrameCache,
    pub time_base: TimeBase,
    /// 디코더가 마지막으로 만든 프레임 번호 (캐시 히트가 이어지면 화면보다 앞설 수 있음)
    pub decoder_position: i64,
    last_decoded: Option<D::Raw>,
    /// 화면으로 넘기는 버퍼 (frame_data_size 고정)
    frame_data: Vec<u8>,
    /// frame_data에 지금 들어 있는 프레임 번호
    frame_data_index: Option<i64>,
    reads: u64,
    container_seeks: u64,
}

impl<D: Decoder, C: Converter<D::Raw>> Session<D, C> {
    pub fn new(decoder: D, converter: C, cache: FrameCache) -> Self {
        let frame_data_size = decoder.info().frame_data_size();
        log::info!(
            "frame size: {} bytes ({:.3} MB)",
            frame_data_size,
            frame_data_size as f64 / (1024.0 * 1024.0)
        );

        Self {
            decoder,
            converter,
            cache,
            time_base: TimeBase::new(),
            decoder_position: 0,
            last_decoded: None,
            frame_data: vec![0u8; frame_data_size],
            frame_data_index: None,
            reads: 0,
            container_seeks: 0,
        }
    }

    pub fn info(&self) -> &StreamInfo {
        self.decoder.info()
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// 디코더에서 한 프레임 읽고 원본은 세션이 보관 (pts, duration, keyframe 여부 반환)
    pub fn read_frame(&mut self) -> Result<(i64, i64, bool), PlayerError> {
        self.reads += 1;
        let DecodedFrame {
            pts,
            duration_hint,
            is_key,
            raw,
        } = self.decoder.read_next_video_frame()?;
        self.last_decoded = Some(raw);
        Ok((pts, duration_hint, is_key))
    }

    /// 컨테이너 seek (키프레임 탐색용)
    pub fn seek_container(&mut self, pts: i64, backward: bool) -> Result<(), PlayerError> {
        self.container_seeks += 1;
        self.decoder.seek(pts, backward)
    }

    /// 방금 디코딩한 프레임을 캐시에 저장 (이미 있으면 변환도 생략)
    pub fn cache_current_frame(&mut self, frame_index: i64) -> Result<(), PlayerError> {
        if self.cache.contains(frame_index) {
            return Ok(());
        }
        self.convert_last_decoded(frame_index)?;
        self.cache.put(frame_index, &self.frame_data);
        Ok(())
    }

    /// 캐시 히트 시 픽셀을 화면 버퍼로 복사. 미스면 false
    pub fn serve_cached(&mut self, frame_index: i64) -> bool {
        let Some(record) = self.cache.get(frame_index) else {
            return false;
        };
        let len = record.pixels().len().min(self.frame_data.len());
        self.frame_data[..len].copy_from_slice(&record.pixels()[..len]);
        self.frame_data_index = Some(frame_index);
        true
    }

    /// 디코더가 마지막으로 도착한 프레임을 화면 버퍼에 반영
    /// (forward 탐색 1단계 프레임처럼 캐시되지 않은 프레임도 보여줘야 함)
    pub fn present_decoded(&mut self) -> Result<(), PlayerError> {
        if self.frame_data_index == Some(self.decoder_position) {
            return Ok(());
        }
        self.convert_last_decoded(self.decoder_position)
    }

    pub fn frame_data(&self) -> &[u8] {
        &self.frame_data
    }

    /// (읽기 횟수, 컨테이너 seek 횟수)
    pub fn io_counters(&self) -> (u64, u64) {
        (self.reads, self.container_seeks)
    }

    fn convert_last_decoded(&mut self, frame_index: i64) -> Result<(), PlayerError> {
        let raw = self
            .last_decoded
            .as_ref()
            .ok_or_else(|| PlayerError::Convert("no decoded frame available".into()))?;
        self.converter.convert(raw, &mut self.frame_data)?;
        self.frame_data_index = Some(frame_index);
        Ok(())
    }
}
