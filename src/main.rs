// frame-player 실행 파일
// frame-player <PATH> [CACHE_SIZE_MB]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use frame_player::display;
use frame_player::ffmpeg::FfmpegDecoder;
use frame_player::playback::DEFAULT_CACHE_SIZE_MB;
use frame_player::{PlaybackController, PlayerConfig, PlayerError, Session};

#[derive(Parser, Debug)]
#[command(name = "frame-player", version, about = "Frame-accurate video player")]
struct Cli {
    /// 재생할 비디오 파일
    path: PathBuf,
    /// 프레임 캐시 크기 (MB)
    #[arg(default_value_t = DEFAULT_CACHE_SIZE_MB)]
    cache_size_mb: u64,
}

fn run(cli: &Cli) -> Result<(), PlayerError> {
    let config = PlayerConfig {
        cache_size_mb: cli.cache_size_mb,
        ..PlayerConfig::default()
    };
    log::info!("opening {} (cache {} MB)", cli.path.display(), config.cache_size_mb);

    let decoder = FfmpegDecoder::open(&cli.path)?;
    let converter = decoder.converter()?;
    let session = Session::new(decoder, converter, config.frame_cache());
    let controller = PlaybackController::new(config.seek_engine());

    display::run_window(session, controller)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_end_of_stream() => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
