//! Plays the alarm sound, or beeps when it can't.
//!
//! The rodio output stream can't leave the thread that opened it, so the
//! [`Notifier`] owns an audio thread and hands it requests over a channel.
//! Callers never wait for playback and never see playback errors: those are
//! logged and answered with a [`Fallback`] beep.

use std::{
    fs::File,
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use thiserror::Error;

use crate::config::Config;

/// something that can ring for an expired alarm
pub trait Notify: Send + Sync {
    fn notify(&self, resource_id: &str);
}

/// audible alert used when the sound can't be played
pub trait Fallback: Send + Sync + 'static {
    fn beep(&self, cause: &NotifyError);
}

/// rings the terminal bell
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl Fallback for TerminalBell {
    fn beep(&self, _cause: &NotifyError) {
        let mut stdout = io::stdout();
        if let Err(err) = stdout.write_all(b"\x07").and_then(|()| stdout.flush()) {
            log::error!("couldn't ring the terminal bell: {err}");
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("sound {0} not found")]
    ResourceNotFound(String),
    #[error("can't decode sound file {}: {reason}", .path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("couldn't read sound file {}: {source}", .path.display())]
    IoFailure { path: PathBuf, source: io::Error },
}

impl NotifyError {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ResourceNotFound(_) => "ResourceNotFound",
            Self::UnsupportedFormat { .. } => "UnsupportedFormat",
            Self::DeviceUnavailable(_) => "DeviceUnavailable",
            Self::IoFailure { .. } => "IOFailure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Output {
    #[default]
    Default,
    // never open a device, every sound fails with DeviceUnavailable
    Disabled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// where sounds referenced by name live
    pub sounds_dir: Option<PathBuf>,
    /// 0 to 100
    pub volume: f32,
    pub output: Output,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sounds_dir: None,
            volume: 100.0,
            output: Output::Default,
        }
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            sounds_dir: Config::sounds_path(),
            volume: config.volume,
            output: Output::Default,
        }
    }
}

pub struct Notifier {
    requests: Option<Sender<String>>,
    worker: Option<JoinHandle<()>>,
    fallback: Arc<dyn Fallback>,
    // whether dropping waits for sounds that are still playing
    drain: Arc<AtomicBool>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("requests", &self.requests)
            .field("worker", &self.worker)
            .field("drain", &self.drain)
            .finish_non_exhaustive()
    }
}

impl Notifier {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self::with_fallback(settings, TerminalBell)
    }

    pub fn with_fallback<F: Fallback>(settings: Settings, fallback: F) -> Self {
        let fallback: Arc<dyn Fallback> = Arc::new(fallback);
        let drain = Arc::new(AtomicBool::new(false));
        let (requests, receiver) = mpsc::channel();
        let worker = {
            let fallback = Arc::clone(&fallback);
            let drain = Arc::clone(&drain);
            thread::spawn(move || run_audio_thread(&receiver, &settings, fallback.as_ref(), &drain))
        };
        Self {
            requests: Some(requests),
            worker: Some(worker),
            fallback,
            drain,
        }
    }

    /// makes dropping the notifier block until every sound has played out
    ///
    /// without this, sounds are cut off when the notifier goes away, which is
    /// what a closing window wants
    pub fn wait_for_sounds_on_drop(&self) {
        self.drain.store(true, Ordering::SeqCst);
    }
}

impl Notify for Notifier {
    fn notify(&self, resource_id: &str) {
        let sent = self
            .requests
            .as_ref()
            .is_some_and(|requests| requests.send(resource_id.to_string()).is_ok());
        if !sent {
            let err = NotifyError::DeviceUnavailable("audio thread is gone".into());
            log::error!("[{}] {err}, can't play {resource_id}", err.kind());
            self.fallback.beep(&err);
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        drop(self.requests.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("audio thread panicked");
            }
        }
    }
}

/// serves requests until the notifier hangs up
fn run_audio_thread(
    requests: &Receiver<String>,
    settings: &Settings,
    fallback: &dyn Fallback,
    drain: &AtomicBool,
) {
    let stream = match settings.output {
        Output::Default => match OutputStream::try_default() {
            Ok(stream) => Some(stream),
            Err(err) => {
                log::warn!("couldn't open the default audio output: {err}");
                None
            }
        },
        Output::Disabled => None,
    };
    let handle = stream.as_ref().map(|(_stream, handle)| handle);
    let mut playing: Vec<Sink> = Vec::new();
    for resource_id in requests {
        playing.retain(|sink| !sink.empty());
        let played = locate(&resource_id, settings.sounds_dir.as_deref())
            .and_then(|path| play(handle, &path, settings.volume));
        match played {
            Ok(sink) => {
                log::info!("playing {resource_id}");
                playing.push(sink);
            }
            Err(err) => {
                log::error!("[{}] {err}, falling back to a beep", err.kind());
                fallback.beep(&err);
            }
        }
    }
    // the stream has to outlive the sinks it drains
    finish(playing, drain.load(Ordering::SeqCst));
    drop(stream);
}

// dropping a sink stops it
fn finish(playing: Vec<Sink>, drain: bool) {
    if drain {
        for sink in &playing {
            sink.sleep_until_end();
        }
    } else if !playing.is_empty() {
        log::info!("stopping {} sound(s) still playing", playing.len());
    }
}

/// finds the file for a sound given as a path or as a name in `sounds_dir`
pub fn locate(resource_id: &str, sounds_dir: Option<&Path>) -> Result<PathBuf, NotifyError> {
    let mut candidates = vec![PathBuf::from(resource_id)];
    if let Some(dir) = sounds_dir {
        candidates.push(dir.join(resource_id));
        candidates.push(dir.join(format!("{resource_id}.wav")));
    }
    candidates
        .into_iter()
        .find(|path| path.is_file())
        .ok_or_else(|| NotifyError::ResourceNotFound(resource_id.to_string()))
}

/// starts playing `path` and returns the sink it plays in
pub fn play(
    output: Option<&OutputStreamHandle>,
    path: &Path,
    volume: f32,
) -> Result<Sink, NotifyError> {
    let file = File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => NotifyError::ResourceNotFound(path.display().to_string()),
        _ => NotifyError::IoFailure {
            path: path.to_path_buf(),
            source: err,
        },
    })?;
    let source = Decoder::new(BufReader::new(file)).map_err(|err| NotifyError::UnsupportedFormat {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let output = output.ok_or_else(|| NotifyError::DeviceUnavailable("no output stream".into()))?;
    let sink = Sink::try_new(output).map_err(|err| NotifyError::DeviceUnavailable(err.to_string()))?;
    sink.set_volume(volume / 100.0);
    sink.append(source);
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Mutex, time::Duration};

    use pretty_assertions::assert_eq;
    use rodio::{source::SineWave, Source};

    use super::*;

    type Beeps = Arc<Mutex<Vec<&'static str>>>;

    // remembers why it had to beep
    struct Causes(Beeps);

    impl Fallback for Causes {
        fn beep(&self, cause: &NotifyError) {
            self.0.lock().unwrap().push(cause.kind());
        }
    }

    fn silent_notifier(sounds_dir: Option<PathBuf>) -> (Notifier, Beeps) {
        let beeps = Beeps::default();
        let notifier = Notifier::with_fallback(
            Settings {
                sounds_dir,
                output: Output::Disabled,
                ..Settings::default()
            },
            Causes(Arc::clone(&beeps)),
        );
        (notifier, beeps)
    }

    // 8 samples of 16 bit mono PCM
    fn write_wav(path: &Path) {
        let samples: [i16; 8] = [0, 1000, 2000, 1000, 0, -1000, -2000, -1000];
        let data_len = u32::try_from(samples.len() * 2).unwrap();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&8000u32.to_le_bytes());
        bytes.extend_from_slice(&16000u32.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn missing_resource_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate("nope", Some(dir.path())).unwrap_err();
        assert_eq!(err.kind(), "ResourceNotFound");
    }

    #[test]
    fn locates_by_path_and_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let bell = dir.path().join("bell.wav");
        write_wav(&bell);

        assert_eq!(locate(bell.to_str().unwrap(), None).unwrap(), bell);
        assert_eq!(locate("bell.wav", Some(dir.path())).unwrap(), bell);
        assert_eq!(locate("bell", Some(dir.path())).unwrap(), bell);
        assert!(locate("bell", None).is_err());
    }

    #[test]
    fn garbage_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarm.wav");
        fs::write(&path, "this is not a sound").unwrap();
        let err = play(None, &path, 100.0).err().unwrap();
        assert_eq!(err.kind(), "UnsupportedFormat");
    }

    #[test]
    fn playable_sound_without_device_is_device_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarm.wav");
        write_wav(&path);
        let err = play(None, &path, 100.0).err().unwrap();
        assert_eq!(err.kind(), "DeviceUnavailable");
    }

    #[test]
    fn vanished_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = play(None, &dir.path().join("gone.wav"), 100.0).err().unwrap();
        assert!(matches!(err, NotifyError::ResourceNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_path_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("alarm.wav");
        write_wav(&file);
        // a regular file can't be walked into, which is not a missing file
        let err = play(None, &file.join("inner.wav"), 100.0).err().unwrap();
        assert!(matches!(err, NotifyError::IoFailure { .. }), "{err:?}");
        assert_eq!(err.kind(), "IOFailure");
    }

    #[test]
    fn nonexistent_resource_falls_back_to_beep() {
        let (notifier, beeps) = silent_notifier(None);
        notifier.notify("definitely/not/here.wav");
        // dropping waits for the audio thread to drain its requests
        drop(notifier);
        assert_eq!(*beeps.lock().unwrap(), vec!["ResourceNotFound"]);
    }

    #[test]
    fn every_failure_beeps_once_with_its_kind() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("alarm.wav"));
        fs::write(dir.path().join("notes.txt"), "la la la").unwrap();

        let (notifier, beeps) = silent_notifier(Some(dir.path().to_path_buf()));
        notifier.notify("alarm");
        notifier.notify("notes.txt");
        notifier.notify("missing");
        drop(notifier);
        assert_eq!(
            *beeps.lock().unwrap(),
            vec!["DeviceUnavailable", "UnsupportedFormat", "ResourceNotFound"]
        );
    }

    #[test]
    fn lost_audio_thread_beeps_through_the_given_fallback() {
        let beeps = Beeps::default();
        let notifier = Notifier {
            requests: None,
            worker: None,
            fallback: Arc::new(Causes(Arc::clone(&beeps))),
            drain: Arc::default(),
        };
        notifier.notify("alarm");
        assert_eq!(*beeps.lock().unwrap(), vec!["DeviceUnavailable"]);
    }

    #[test]
    fn hung_up_audio_thread_beeps_through_the_given_fallback() {
        let beeps = Beeps::default();
        let (requests, receiver) = mpsc::channel();
        drop(receiver);
        let notifier = Notifier {
            requests: Some(requests),
            worker: None,
            fallback: Arc::new(Causes(Arc::clone(&beeps))),
            drain: Arc::default(),
        };
        notifier.notify("alarm");
        notifier.notify("alarm");
        assert_eq!(beeps.lock().unwrap().len(), 2);
    }

    #[test]
    fn finishing_without_draining_stops_playback() {
        // nothing pulls from an idle sink's queue, waiting on it would hang
        let (sink, _queue) = Sink::new_idle();
        sink.append(SineWave::new(440.0).take_duration(Duration::from_secs(600)));
        assert!(!sink.empty());
        finish(vec![sink], false);
    }

    #[test]
    fn draining_is_opt_in() {
        let (notifier, _beeps) = silent_notifier(None);
        assert!(!notifier.drain.load(Ordering::SeqCst));
        notifier.wait_for_sounds_on_drop();
        assert!(notifier.drain.load(Ordering::SeqCst));
    }
}
