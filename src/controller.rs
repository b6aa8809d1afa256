use std::{
    ops::ControlFlow,
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use chrono::{DateTime, Local};

use crate::{
    alarm::{parse_duration, Alarm, InvalidInput, Unit},
    communication::{Message, MessageType},
    notifier::Notify,
    schedule::Activity,
};

/// whatever shows the alarm to the user
///
/// reports are only ever made from the thread that owns the controller
pub trait DisplaySurface {
    fn report_status(&mut self, status: &str);
    fn report_countdown(&mut self, remaining_seconds: u64);
    /// time is up, the surface decides how to alert the user
    fn report_completion(&mut self);
}

/// owns the single alarm and the two activities that drive it
///
/// the tick and timeout activities aren't synchronized with each other, so the
/// last `00:00` countdown may arrive before or after the completion
#[derive(Debug)]
pub struct AlarmController<N> {
    alarm: Arc<Mutex<Alarm>>,
    tick: Option<Activity>,
    timeout: Option<Activity>,
    notifier: Arc<N>,
    sound: String,
    second: Duration,
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    // id of the alarm whose events may still reach the display
    current: u64,
}

fn lock(alarm: &Mutex<Alarm>) -> MutexGuard<'_, Alarm> {
    alarm.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<N: Notify + 'static> AlarmController<N> {
    /// `sound` is handed to the notifier every time an alarm expires
    pub fn new(notifier: N, sound: impl Into<String>) -> Self {
        Self::with_second(notifier, sound, Duration::from_secs(1))
    }

    /// like [`Self::new`] but with a custom length of a second
    pub fn with_second(notifier: N, sound: impl Into<String>, second: Duration) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            alarm: Arc::new(Mutex::new(Alarm::default())),
            tick: None,
            timeout: None,
            notifier: Arc::new(notifier),
            sound: sound.into(),
            second,
            sender,
            receiver,
            current: 0,
        }
    }

    /// replaces whatever alarm was running with one going off after
    /// `raw_value` `unit`s
    ///
    /// the previous alarm is cancelled even if `raw_value` turns out to be
    /// invalid
    ///
    /// # Errors
    /// if `raw_value` is not a positive integer, the reason is also reported
    /// as status
    pub fn set_alarm(
        &mut self,
        raw_value: &str,
        unit: Unit,
        surface: &mut impl DisplaySurface,
    ) -> Result<u64, InvalidInput> {
        self.cancel();
        let value = match parse_duration(raw_value) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("rejected alarm duration {raw_value:?}: {err:?}");
                surface.report_status(&err.to_string());
                return Err(err);
            }
        };
        let total_seconds = unit.to_seconds(value);
        let id = self.current;
        lock(&self.alarm).arm(id, total_seconds);
        surface.report_countdown(total_seconds);

        self.tick = Some(self.schedule_tick(id));
        self.timeout = Some(self.schedule_timeout(id, total_seconds));

        log::info!("alarm {id} set for {value} {unit} ({total_seconds}s)");
        surface.report_status(&format!("Alarm set for {value} {unit}."));
        Ok(total_seconds)
    }

    fn schedule_tick(&self, id: u64) -> Activity {
        let alarm = Arc::clone(&self.alarm);
        let sender = self.sender.clone();
        Activity::every("tick", self.second, move || {
            let Some(remaining) = lock(&alarm).tick(id) else {
                return ControlFlow::Break(());
            };
            if sender
                .send(Message::new(MessageType::Tick { remaining }, id))
                .is_err()
                || remaining == 0
            {
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        })
    }

    fn schedule_timeout(&self, id: u64, total_seconds: u64) -> Activity {
        let alarm = Arc::clone(&self.alarm);
        let sender = self.sender.clone();
        let notifier = Arc::clone(&self.notifier);
        let sound = self.sound.clone();
        let delay = self
            .second
            .saturating_mul(u32::try_from(total_seconds).unwrap_or(u32::MAX));
        Activity::once("timeout", delay, move || {
            if !lock(&alarm).is_current(id) {
                return;
            }
            log::info!("alarm {id} expired");
            notifier.notify(&sound);
            // the controller, and with it the receiver, may already be gone
            let _ = sender.send(Message::new(MessageType::Expired, id));
            lock(&alarm).expire(id);
        })
    }

    /// stops the current alarm, if any, and drops its undelivered reports
    pub fn cancel(&mut self) {
        if let Some(mut tick) = self.tick.take() {
            tick.cancel();
        }
        if let Some(mut timeout) = self.timeout.take() {
            timeout.cancel();
        }
        let mut alarm = lock(&self.alarm);
        if alarm.armed {
            log::info!("alarm {} cancelled", alarm.id);
        }
        alarm.disarm();
        self.current = self.current.wrapping_add(1);
    }

    /// hands queued reports to `surface`, returns how many were delivered
    pub fn pump(&mut self, surface: &mut impl DisplaySurface) -> usize {
        let mut delivered = 0;
        while let Ok(message) = self.receiver.try_recv() {
            delivered += usize::from(self.deliver(message, surface));
        }
        delivered
    }

    /// waits up to `timeout` for a report, then pumps
    pub fn wait(&mut self, surface: &mut impl DisplaySurface, timeout: Duration) -> usize {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => usize::from(self.deliver(message, surface)) + self.pump(surface),
            Err(_) => 0,
        }
    }

    fn deliver(&self, message: Message, surface: &mut impl DisplaySurface) -> bool {
        if message.alarm_id != self.current {
            log::debug!("dropping report of superseded alarm {}", message.alarm_id);
            return false;
        }
        match message.kind {
            MessageType::Tick { remaining } => surface.report_countdown(remaining),
            MessageType::Expired => surface.report_completion(),
        }
        true
    }

    #[must_use]
    pub fn alarm(&self) -> Alarm {
        *lock(&self.alarm)
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.alarm().armed
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u64 {
        self.alarm().remaining_seconds
    }

    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        self.alarm().total_seconds
    }

    #[must_use]
    pub fn rings_at(&self) -> Option<DateTime<Local>> {
        let alarm = self.alarm();
        alarm.rings_at.filter(|_| alarm.armed)
    }

    #[must_use]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}

impl<N> Drop for AlarmController<N> {
    fn drop(&mut self) {
        drop(self.tick.take());
        drop(self.timeout.take());
    }
}
