// 재생 컨트롤러 - 모드 상태 머신 + 틱 단위 프레임 결정
// 캐시 우선 조회 → 미스면 SeekEngine

use super::seek::{SeekEngine, SeekOutcome};
use super::session::Session;
use super::source::{Converter, Decoder};
use crate::error::PlayerError;

/// 사용자 선택 재생 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    #[default]
    Play,
    Rewind,
    Pause,
    /// 한 프레임 전진 후 Pause
    StepForward,
    /// 한 프레임 후진 후 Pause
    StepBackward,
}

impl PlaybackMode {
    /// 상태 표시줄용 이름
    pub fn name(self) -> &'static str {
        match self {
            PlaybackMode::Play => "PLAY",
            PlaybackMode::Rewind => "REWIND",
            PlaybackMode::Pause => "PAUSE",
            PlaybackMode::StepForward => "FF",
            PlaybackMode::StepBackward => "FB",
        }
    }

    /// 이번 틱에 보여줄 프레임 (0 아래로는 내려가지 않음)
    pub fn desired_frame(self, displayed: i64) -> i64 {
        match self {
            PlaybackMode::Play | PlaybackMode::StepForward => displayed + 1,
            PlaybackMode::Rewind | PlaybackMode::StepBackward => (displayed - 1).max(0),
            PlaybackMode::Pause => displayed,
        }
    }

    /// 틱이 끝난 뒤의 모드 (단일 스텝은 Pause로 복귀)
    pub fn after_tick(self) -> Self {
        match self {
            PlaybackMode::StepForward | PlaybackMode::StepBackward => PlaybackMode::Pause,
            other => other,
        }
    }
}

/// 화면/입력 계층이 넘겨주는 이벤트 (틱마다 모드 계산 전에 소비)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Play,
    Rewind,
    Pause,
    StepForward,
    StepBackward,
    ToggleCacheDebug,
    Quit,
}

/// 틱 한 번의 결과
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub desired: i64,
    pub displayed: i64,
    pub cache_hit: bool,
    pub mode: PlaybackMode,
    pub seek: Option<SeekOutcome>,
}

impl TickReport {
    /// `f 00075, c 0012.35 MB, t 01:15, m PLAY C`
    pub fn status_text(&self, cache_megabytes: f64) -> String {
        format!(
            "f {:05}, c {:07.2} MB, t {:02}:{:02}, m {} {}",
            self.displayed,
            cache_megabytes,
            self.displayed / 60,
            self.displayed % 60,
            self.mode.name(),
            if self.cache_hit { 'C' } else { ' ' }
        )
    }
}

/// 재생 컨트롤러
pub struct PlaybackController {
    mode: PlaybackMode,
    displayed_frame: i64,
    cache_debug: bool,
    quit_requested: bool,
    seek_engine: SeekEngine,
}

impl PlaybackController {
    pub fn new(seek_engine: SeekEngine) -> Self {
        Self {
            mode: PlaybackMode::Play,
            displayed_frame: 0,
            cache_debug: false,
            quit_requested: false,
            seek_engine,
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn displayed_frame(&self) -> i64 {
        self.displayed_frame
    }

    pub fn cache_debug(&self) -> bool {
        self.cache_debug
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Play => self.mode = PlaybackMode::Play,
            InputEvent::Rewind => self.mode = PlaybackMode::Rewind,
            InputEvent::Pause => self.mode = PlaybackMode::Pause,
            InputEvent::StepForward => self.mode = PlaybackMode::StepForward,
            InputEvent::StepBackward => self.mode = PlaybackMode::StepBackward,
            InputEvent::ToggleCacheDebug => self.cache_debug = !self.cache_debug,
            InputEvent::Quit => self.quit_requested = true,
        }
    }

    /// 틱 한 번: 목표 프레임 결정 → 캐시 → (미스면) seek → 화면 버퍼 갱신
    pub fn tick<D, C>(&mut self, session: &mut Session<D, C>) -> Result<TickReport, PlayerError>
    where
        D: Decoder,
        C: Converter<D::Raw>,
    {
        let desired = self.mode.desired_frame(self.displayed_frame);
        self.mode = self.mode.after_tick();

        if session.serve_cached(desired) {
            self.displayed_frame = desired;
            return Ok(TickReport {
                desired,
                displayed: desired,
                cache_hit: true,
                mode: self.mode,
                seek: None,
            });
        }

        let outcome = self.seek_engine.seek_to(session, desired)?;
        session.present_decoded()?;
        self.displayed_frame = session.decoder_position;

        if self.displayed_frame != desired {
            log::warn!("wanted frame {}, got {} instead!", desired, self.displayed_frame);
        }

        Ok(TickReport {
            desired,
            displayed: self.displayed_frame,
            cache_hit: false,
            mode: self.mode,
            seek: Some(outcome),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::seek::SeekStrategy;
    use crate::playback::testing::{session_with, FillConverter, ScriptedDecoder};

    type TestSession = Session<ScriptedDecoder, FillConverter>;

    fn play_ticks(controller: &mut PlaybackController, session: &mut TestSession, n: usize) {
        for _ in 0..n {
            controller.tick(session).unwrap();
        }
    }

    #[test]
    fn test_mode_table() {
        assert_eq!(PlaybackMode::Play.desired_frame(10), 11);
        assert_eq!(PlaybackMode::Rewind.desired_frame(10), 9);
        assert_eq!(PlaybackMode::Pause.desired_frame(10), 10);
        assert_eq!(PlaybackMode::StepForward.desired_frame(10), 11);
        assert_eq!(PlaybackMode::StepBackward.desired_frame(10), 9);

        assert_eq!(PlaybackMode::Play.after_tick(), PlaybackMode::Play);
        assert_eq!(PlaybackMode::Rewind.after_tick(), PlaybackMode::Rewind);
        assert_eq!(PlaybackMode::Pause.after_tick(), PlaybackMode::Pause);
        assert_eq!(PlaybackMode::StepForward.after_tick(), PlaybackMode::Pause);
        assert_eq!(PlaybackMode::StepBackward.after_tick(), PlaybackMode::Pause);
    }

    #[test]
    fn test_rewind_holds_at_zero() {
        assert_eq!(PlaybackMode::Rewind.desired_frame(0), 0);
        assert_eq!(PlaybackMode::StepBackward.desired_frame(0), 0);
    }

    #[test]
    fn test_first_ticks_decode_from_start() {
        let mut controller = PlaybackController::new(SeekEngine::default());
        let mut session = session_with(ScriptedDecoder::new(100, 10), 64);

        // 첫 틱: 1을 원하지만 스트림 첫 프레임은 0
        let first = controller.tick(&mut session).unwrap();
        assert_eq!(first.desired, 1);
        assert_eq!(first.displayed, 0);
        assert!(!first.cache_hit);

        let second = controller.tick(&mut session).unwrap();
        assert_eq!(second.displayed, 1);
        assert_eq!(second.seek.map(|s| s.strategy), Some(SeekStrategy::Consecutive));
        assert_eq!(session.frame_data()[0], 1);
    }

    #[test]
    fn test_rewind_served_from_cache() {
        let mut controller = PlaybackController::new(SeekEngine::default());
        let mut session = session_with(ScriptedDecoder::new(100, 10), 64);
        play_ticks(&mut controller, &mut session, 11);
        assert_eq!(controller.displayed_frame(), 10);

        controller.handle_input(InputEvent::Rewind);
        let report = controller.tick(&mut session).unwrap();
        assert!(report.cache_hit);
        assert_eq!(report.displayed, 9);
        assert_eq!(report.mode, PlaybackMode::Rewind);
        assert_eq!(session.frame_data()[0], 9);
        // 캐시 히트는 디코더를 움직이지 않음
        assert_eq!(session.decoder_position, 10);
    }

    #[test]
    fn test_step_reverts_to_pause() {
        let mut controller = PlaybackController::new(SeekEngine::default());
        let mut session = session_with(ScriptedDecoder::new(100, 10), 64);
        play_ticks(&mut controller, &mut session, 6);

        controller.handle_input(InputEvent::StepBackward);
        let report = controller.tick(&mut session).unwrap();
        assert_eq!(report.displayed, 4);
        assert_eq!(report.mode, PlaybackMode::Pause);

        let paused = controller.tick(&mut session).unwrap();
        assert_eq!(paused.displayed, 4);
        assert!(paused.cache_hit);

        controller.handle_input(InputEvent::StepForward);
        let report = controller.tick(&mut session).unwrap();
        assert_eq!(report.displayed, 5);
        assert_eq!(controller.mode(), PlaybackMode::Pause);
    }

    #[test]
    fn test_evicted_frame_triggers_backward_seek() {
        let mut controller = PlaybackController::new(SeekEngine::default());
        let mut session = session_with(ScriptedDecoder::new(200, 10), 5);
        play_ticks(&mut controller, &mut session, 21);
        assert_eq!(controller.displayed_frame(), 20);

        controller.handle_input(InputEvent::Rewind);
        for expected in (16..20).rev() {
            let report = controller.tick(&mut session).unwrap();
            assert!(report.cache_hit, "frame {} should still be cached", expected);
            assert_eq!(report.displayed, expected);
        }

        // 15는 이미 퇴출됨 → backward 탐색
        let report = controller.tick(&mut session).unwrap();
        assert!(!report.cache_hit);
        assert_eq!(report.displayed, 15);
        assert_eq!(report.seek.map(|s| s.strategy), Some(SeekStrategy::Backward));
        assert_eq!(session.frame_data()[0], 15);
    }

    #[test]
    fn test_input_flags() {
        let mut controller = PlaybackController::new(SeekEngine::default());
        assert!(!controller.cache_debug());
        controller.handle_input(InputEvent::ToggleCacheDebug);
        assert!(controller.cache_debug());
        controller.handle_input(InputEvent::ToggleCacheDebug);
        assert!(!controller.cache_debug());

        assert!(!controller.quit_requested());
        controller.handle_input(InputEvent::Quit);
        assert!(controller.quit_requested());
        assert_eq!(controller.mode(), PlaybackMode::Play);
    }

    #[test]
    fn test_status_text() {
        let report = TickReport {
            desired: 75,
            displayed: 75,
            cache_hit: true,
            mode: PlaybackMode::Play,
            seek: None,
        };
        assert_eq!(report.status_text(12.3456), "f 00075, c 0012.35 MB, t 01:15, m PLAY C");

        let miss = TickReport { cache_hit: false, mode: PlaybackMode::StepForward, ..report };
        assert_eq!(miss.status_text(0.0), "f 00075, c 0000.00 MB, t 01:15, m FF  ");
    }
}
