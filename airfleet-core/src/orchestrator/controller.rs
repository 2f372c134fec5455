//! Device orchestrator
//!
//! One call to [`Orchestrator::tick`] runs the current state to completion
//! and never blocks. Timers and callbacks reach the orchestrator only
//! through [`Orchestrator::trigger_sample`] and the cloud event queue, both
//! drained at the top of the tick.

use airfleet_protocol::cloud::{
    LevelsUpdate, LEVELS_REQUEST_EVENT, LEVELS_RESPONSE_EVENT, PUBLISH_EVENT,
};

use super::context::Context;
use super::screen::{self, Alert};
use crate::config::Config;
use crate::display::{DisplayLink, LinkError};
use crate::positioning::PositionFix;
use crate::state::{Event, State};
use crate::traits::{
    ClimateReading, CloudTransport, GasReading, LinkRadio, ParticulateReading, Platform,
    PositionSource, Sensor,
};

/// Concrete collaborator types of a board
pub trait Board {
    type Particulate: Sensor<Reading = ParticulateReading>;
    type Climate: Sensor<Reading = ClimateReading>;
    type Gas: Sensor<Reading = GasReading>;
    type Position: PositionSource;
    type Radio: LinkRadio;
    type Cloud: CloudTransport;
    type Platform: Platform;
}

/// Everything the orchestrator drives besides the display radio
pub struct Collaborators<B: Board> {
    pub particulate: B::Particulate,
    pub climate: B::Climate,
    pub gas: B::Gas,
    pub position: B::Position,
    pub cloud: B::Cloud,
    pub platform: B::Platform,
}

/// What the platform sleep primitive must wake on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WakeCondition {
    /// Rising edge of the ignition signal
    pub ignition_rising: bool,
    /// Also wake after this long
    pub check_interval_ms: Option<u32>,
}

/// Tick outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tick {
    Continue,
    /// Everything is powered down; sleep, then call [`Orchestrator::wake`]
    Sleep(WakeCondition),
}

pub struct Orchestrator<B: Board> {
    config: Config,
    state: State,
    ctx: Context,
    sample_requested: bool,
    parts: Collaborators<B>,
    display: DisplayLink<B::Radio>,
}

impl<B: Board> Orchestrator<B> {
    pub fn new(config: Config, parts: Collaborators<B>, radio: B::Radio) -> Self {
        let display = DisplayLink::new(radio, config.link.backoff_ms);
        Self {
            config,
            state: State::Init,
            ctx: Context::default(),
            sample_requested: false,
            parts,
            display,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn display(&self) -> &DisplayLink<B::Radio> {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplayLink<B::Radio> {
        &mut self.display
    }

    pub fn collaborators(&self) -> &Collaborators<B> {
        &self.parts
    }

    pub fn collaborators_mut(&mut self) -> &mut Collaborators<B> {
        &mut self.parts
    }

    /// Request a sample on the next tick; ignored while asleep
    pub fn trigger_sample(&mut self) {
        self.sample_requested = true;
    }

    /// The platform woke from sleep
    pub fn wake(&mut self) {
        self.apply(Event::Woke);
    }

    /// Run one step of the state machine
    pub fn tick(&mut self, now_ms: u32) -> Tick {
        self.drain_cloud_events();
        if core::mem::take(&mut self.sample_requested) {
            self.apply(Event::SampleRequested);
        }

        match self.state {
            State::Init => {
                self.init(now_ms);
                self.apply(Event::InitComplete);
            }
            State::Sample => {
                self.sample(now_ms);
                self.apply(Event::SampleComplete);
            }
            State::Idle => {
                if let Some(event) = self.idle(now_ms) {
                    self.apply(event);
                }
            }
            State::Publish => {
                let event = self.publish(now_ms);
                self.apply(event);
            }
            State::Levels => {
                let event = self.request_levels(now_ms);
                self.apply(event);
            }
            State::Sleep => return Tick::Sleep(self.power_down()),
        }
        Tick::Continue
    }

    fn apply(&mut self, event: Event) {
        let next = self.state.transition(event);
        if next != self.state {
            debug!("node {} -> {} on {}", self.state, next, event);
            self.state = next;
        }
    }

    fn init(&mut self, now_ms: u32) {
        info!("powering on");
        if let Err(err) = self.parts.particulate.on() {
            warn!("particulate sensor on failed: {}", err);
        }
        if let Err(err) = self.parts.climate.on() {
            warn!("climate sensor on failed: {}", err);
        }
        if let Err(err) = self.parts.gas.on() {
            warn!("gas sensor on failed: {}", err);
        }
        self.parts.position.on();
        self.display.power_on(now_ms);

        // The display cache starts blank, so everything is redrawn
        self.ctx.shown = Default::default();
        self.ctx.distance_due = false;

        if !self.ctx.subscribed {
            self.subscribe();
        }
    }

    fn subscribe(&mut self) {
        match self.parts.cloud.subscribe(LEVELS_RESPONSE_EVENT) {
            Ok(()) => self.ctx.subscribed = true,
            Err(err) => warn!("levels subscribe failed: {}", err),
        }
    }

    fn sample(&mut self, now_ms: u32) {
        if let Some(volts) = self.parts.platform.battery_voltage() {
            info!("battery {}V", volts);
        }

        match self.parts.particulate.sample(now_ms) {
            Ok(r) => {
                info!(
                    "pm1 {} pm2.5 {} pm4 {} pm10 {}",
                    r.pm1, r.pm25, r.pm4, r.pm10
                );
                self.ctx.snapshot.particulate = Some(r);
            }
            Err(err) => warn!("particulate sample failed: {}", err),
        }
        match self.parts.climate.sample(now_ms) {
            Ok(r) => {
                info!("temperature {} humidity {}", r.temperature, r.humidity);
                self.ctx.snapshot.climate = Some(r);
            }
            Err(err) => warn!("climate sample failed: {}", err),
        }
        match self.parts.gas.sample(now_ms) {
            Ok(r) => {
                info!("voc {} co2 {}", r.voc, r.co2);
                self.ctx.snapshot.gas = Some(r);
            }
            Err(err) => warn!("gas sample failed: {}", err),
        }

        let fix = self.parts.position.fix();
        info!(
            "gps {} lat {} lng {} speed {} distance {}",
            fix.validity, fix.latitude, fix.longitude, fix.speed_kmh, fix.distance_km
        );
        if fix.is_valid() {
            self.ctx.snapshot.fix = Some(fix);
            if fix.distance_km >= f64::from(self.config.publish.distance_km) {
                self.ctx.distance_due = true;
            }
        }

        self.render(&fix);
    }

    fn render(&mut self, fix: &PositionFix) {
        let gauge = self.config.gauge;
        let snapshot = self.ctx.snapshot;

        if let Some(reading) = snapshot.particulate {
            let shown = (reading, self.ctx.averages.particulate_reference());
            if self.ctx.shown.particulate != Some(shown) {
                let row = screen::particulate_row(&reading, shown.1, &gauge);
                self.show(0, screen::PM_ROW, row.as_bytes());
                self.ctx.shown.particulate = Some(shown);
            }
        }

        if let Some(gas) = snapshot.gas {
            let shown = (gas, self.ctx.averages.co2);
            if self.ctx.shown.gas != Some(shown) {
                let row = screen::co2_row(&gas, shown.1, &gauge);
                self.show(0, screen::CO2_ROW, row.as_bytes());
                self.ctx.shown.gas = Some(shown);
            }
        }

        if let Some(climate) = snapshot.climate {
            if self.ctx.shown.climate != Some(climate) {
                let temperature = screen::temperature(climate.temperature);
                let humidity = screen::humidity(climate.humidity);
                self.show(
                    screen::TEMPERATURE_COL,
                    screen::CLIMATE_ROW,
                    temperature.as_bytes(),
                );
                self.show(screen::HUMIDITY_COL, screen::CLIMATE_ROW, humidity.as_bytes());
                self.ctx.shown.climate = Some(climate);
            }
        }

        let speed = screen::speed(fix);
        self.show(screen::SPEED_COL, screen::CLIMATE_ROW, speed.as_bytes());

        let clock = screen::clock(&fix.datetime);
        if self.ctx.shown.clock.as_ref() != Some(&clock) {
            self.show(screen::CLOCK_COL, screen::STATUS_ROW, clock.as_bytes());
            self.ctx.shown.clock = Some(clock);
        }

        let alert = Alert::evaluate(
            snapshot.particulate.as_ref(),
            snapshot.gas.as_ref(),
            &self.config.alert,
        );
        if self.ctx.shown.alert != Some(alert) {
            self.show_alert(alert);
            self.ctx.shown.alert = Some(alert);
        }
    }

    fn show_alert(&mut self, alert: Alert) {
        let status = screen::status(alert);
        if alert.is_active() {
            warn!("air quality alert: {}", alert);
            self.show(screen::ALERT_COL, screen::STATUS_ROW, status.as_bytes());
            let result = self.display.enable_flash(
                screen::ALERT_COL,
                screen::STATUS_ROW,
                alert.text().as_bytes(),
                self.config.alert.flash_interval_ms,
            );
            log_display_error(result);
        } else {
            log_display_error(self.display.disable_flash());
            self.show(screen::ALERT_COL, screen::STATUS_ROW, status.as_bytes());
        }
    }

    fn show(&mut self, x: u8, y: u8, text: &[u8]) {
        log_display_error(self.display.print(x, y, text));
    }

    fn idle(&mut self, now_ms: u32) -> Option<Event> {
        self.display.service(now_ms);
        self.parts.particulate.service(now_ms);
        self.parts.climate.service(now_ms);
        self.parts.gas.service(now_ms);
        self.parts.position.service(now_ms);

        if self.ctx.levels_timed_out(now_ms, &self.config.levels) {
            warn!("levels response timed out");
            self.ctx.levels_pending_since = None;
            self.ctx.last_levels_ms = None;
            self.parts.cloud.disconnect();
        }

        if !self.parts.platform.ignition_on() {
            return Some(Event::IgnitionOff);
        }
        if self.ctx.publish_due(now_ms, &self.config.publish) {
            return Some(Event::PublishDue);
        }
        None
    }

    fn publish(&mut self, now_ms: u32) -> Event {
        if !self.parts.cloud.is_connected() {
            debug!("cloud not connected, publish deferred");
            self.parts.cloud.connect();
            return Event::Deferred;
        }
        if !self.ctx.subscribed {
            self.subscribe();
        }

        let fix = self.ctx.snapshot.fix.unwrap_or_default();
        let time = fix.datetime.format();
        match self.ctx.snapshot.payload(&time).encode() {
            Ok(payload) => match self.parts.cloud.publish(PUBLISH_EVENT, &payload) {
                Ok(()) => info!("published {} bytes", payload.len()),
                Err(err) => warn!("publish failed: {}", err),
            },
            Err(err) => warn!("telemetry encode failed: {}", err),
        }

        // Fire and forget: the interval restarts whether or not it went out
        self.parts.position.reset_distance();
        self.ctx.distance_due = false;
        self.ctx.last_publish_ms = now_ms;

        if self.ctx.levels_due(now_ms, &self.config.levels) {
            return Event::LevelsDue;
        }
        if self.ctx.levels_pending_since.is_none() {
            self.parts.cloud.disconnect();
        }
        Event::Published
    }

    fn request_levels(&mut self, now_ms: u32) -> Event {
        if !self.parts.cloud.is_connected() {
            self.parts.cloud.connect();
            return Event::Deferred;
        }
        match self.parts.cloud.publish(LEVELS_REQUEST_EVENT, "") {
            Ok(()) => {
                self.ctx.last_levels_ms = Some(now_ms);
                self.ctx.levels_pending_since = Some(now_ms);
            }
            Err(err) => {
                warn!("levels request failed: {}", err);
                self.parts.cloud.disconnect();
            }
        }
        Event::LevelsRequested
    }

    fn drain_cloud_events(&mut self) {
        while let Some(event) = self.parts.cloud.poll_event() {
            if !event.name.starts_with(LEVELS_RESPONSE_EVENT) {
                trace!("ignoring cloud event {}", event.name.as_str());
                continue;
            }
            match LevelsUpdate::parse(event.data.as_bytes()) {
                Ok(update) => {
                    self.ctx.averages.apply(&update);
                    info!(
                        "levels co2 {} pm {}",
                        self.ctx.averages.co2, self.ctx.averages.particulate
                    );
                }
                Err(err) => warn!("levels response malformed: {}", err),
            }
            self.ctx.levels_pending_since = None;
            self.parts.cloud.disconnect();
        }
    }

    fn power_down(&mut self) -> WakeCondition {
        info!("powering down");
        log_display_error(self.display.disable_flash());
        log_display_error(self.display.clear());
        self.show(0, 0, screen::POWERING_DOWN.as_bytes());

        if let Err(err) = self.parts.particulate.off() {
            warn!("particulate sensor off failed: {}", err);
        }
        if let Err(err) = self.parts.climate.off() {
            warn!("climate sensor off failed: {}", err);
        }
        if let Err(err) = self.parts.gas.off() {
            warn!("gas sensor off failed: {}", err);
        }
        self.parts.position.off();
        self.parts.cloud.disconnect();
        self.display.power_off();
        self.ctx.levels_pending_since = None;

        WakeCondition {
            ignition_rising: true,
            check_interval_ms: self.config.sleep.check_interval_ms,
        }
    }
}

/// Not-ready is routine while the link reconnects
fn log_display_error<T>(result: Result<T, LinkError>) {
    match result {
        Ok(_) | Err(LinkError::NotReady) => {}
        Err(err) => warn!("display update failed: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positioning::{UtcDateTime, Validity};
    use crate::traits::{ChannelHandle, CloudError, CloudEvent, RadioError, RadioEvent, SensorError};
    use airfleet_protocol::link::{PeerAddress, Uuid};
    use std::collections::VecDeque;
    use std::string::String;
    use std::vec::Vec;

    struct FakeSensor<R> {
        reading: Result<R, SensorError>,
        powered: bool,
        serviced: u32,
    }

    impl<R> FakeSensor<R> {
        fn new(reading: R) -> Self {
            Self {
                reading: Ok(reading),
                powered: false,
                serviced: 0,
            }
        }
    }

    impl<R: Copy + PartialEq> Sensor for FakeSensor<R> {
        type Reading = R;

        fn on(&mut self) -> Result<(), SensorError> {
            self.powered = true;
            Ok(())
        }

        fn off(&mut self) -> Result<(), SensorError> {
            self.powered = false;
            Ok(())
        }

        fn service(&mut self, _now_ms: u32) {
            self.serviced += 1;
        }

        fn sample(&mut self, _now_ms: u32) -> Result<R, SensorError> {
            if !self.powered {
                return Err(SensorError::NotPowered);
            }
            self.reading
        }
    }

    #[derive(Default)]
    struct FakeGps {
        fix: PositionFix,
        powered: bool,
        resets: u32,
    }

    impl PositionSource for FakeGps {
        fn on(&mut self) {
            self.powered = true;
        }

        fn off(&mut self) {
            self.powered = false;
        }

        fn service(&mut self, _now_ms: u32) {}

        fn fix(&self) -> PositionFix {
            self.fix
        }

        fn reset_distance(&mut self) {
            self.resets += 1;
            self.fix.distance_km = 0.0;
        }
    }

    /// Radio with no display in range
    #[derive(Default)]
    struct SilentRadio {
        powered: bool,
    }

    impl LinkRadio for SilentRadio {
        fn power_on(&mut self) {
            self.powered = true;
        }
        fn power_off(&mut self) {
            self.powered = false;
        }
        fn start_scan(&mut self) {}
        fn stop_scan(&mut self) {}
        fn connect(&mut self, _address: PeerAddress) {}
        fn disconnect(&mut self) {}
        fn channel(&self, _id: &Uuid) -> Option<ChannelHandle> {
            None
        }
        fn start_pairing(&mut self) {}
        fn is_pairing(&self) -> bool {
            false
        }
        fn is_connected(&self) -> bool {
            false
        }
        fn write(&mut self, _channel: ChannelHandle, _data: &[u8]) -> Result<(), RadioError> {
            Err(RadioError::NotConnected)
        }
        fn poll_event(&mut self) -> Option<RadioEvent> {
            None
        }
    }

    #[derive(Default)]
    struct FakeCloud {
        connected: bool,
        connect_requests: u32,
        disconnects: u32,
        subscriptions: Vec<String>,
        published: Vec<(String, String)>,
        inbox: VecDeque<CloudEvent>,
    }

    impl FakeCloud {
        fn respond(&mut self, name: &str, data: &str) {
            self.inbox.push_back(CloudEvent {
                name: name.try_into().unwrap(),
                data: data.try_into().unwrap(),
            });
        }

        fn events(&self, name: &str) -> Vec<&str> {
            self.published
                .iter()
                .filter(|(event, _)| event == name)
                .map(|(_, data)| data.as_str())
                .collect()
        }
    }

    impl CloudTransport for FakeCloud {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn connect(&mut self) {
            self.connect_requests += 1;
        }

        fn disconnect(&mut self) {
            self.disconnects += 1;
            self.connected = false;
        }

        fn subscribe(&mut self, event: &str) -> Result<(), CloudError> {
            self.subscriptions.push(event.into());
            Ok(())
        }

        fn publish(&mut self, event: &str, data: &str) -> Result<(), CloudError> {
            if !self.connected {
                return Err(CloudError::NotConnected);
            }
            self.published.push((event.into(), data.into()));
            Ok(())
        }

        fn poll_event(&mut self) -> Option<CloudEvent> {
            self.inbox.pop_front()
        }
    }

    struct FakePlatform {
        ignition: bool,
    }

    impl Platform for FakePlatform {
        fn ignition_on(&mut self) -> bool {
            self.ignition
        }

        fn battery_voltage(&mut self) -> Option<f32> {
            Some(12.6)
        }
    }

    struct TestBoard;

    impl Board for TestBoard {
        type Particulate = FakeSensor<ParticulateReading>;
        type Climate = FakeSensor<ClimateReading>;
        type Gas = FakeSensor<GasReading>;
        type Position = FakeGps;
        type Radio = SilentRadio;
        type Cloud = FakeCloud;
        type Platform = FakePlatform;
    }

    const CLEAN_AIR: ParticulateReading = ParticulateReading {
        pm1: 3.0,
        pm25: 5.0,
        pm4: 6.0,
        pm10: 7.0,
    };

    fn valid_fix(distance_km: f64) -> PositionFix {
        PositionFix {
            latitude: 56.436935,
            longitude: 9.371337,
            speed_kmh: 52.3,
            distance_km,
            datetime: UtcDateTime {
                year: 2024,
                month: 11,
                day: 26,
                hour: 13,
                minute: 50,
                second: 30,
            },
            validity: Validity::Valid,
        }
    }

    fn node() -> Orchestrator<TestBoard> {
        let parts = Collaborators {
            particulate: FakeSensor::new(CLEAN_AIR),
            climate: FakeSensor::new(ClimateReading {
                temperature: 23.4,
                humidity: 45.0,
            }),
            gas: FakeSensor::new(GasReading { voc: 120, co2: 612 }),
            position: FakeGps::default(),
            cloud: FakeCloud::default(),
            platform: FakePlatform { ignition: true },
        };
        Orchestrator::new(Config::default(), parts, SilentRadio::default())
    }

    /// Init and the forced first sample
    fn booted() -> Orchestrator<TestBoard> {
        let mut node = node();
        assert_eq!(node.tick(0), Tick::Continue);
        assert_eq!(node.state(), State::Sample);
        node.tick(10);
        assert_eq!(node.state(), State::Idle);
        node
    }

    fn row(node: &Orchestrator<TestBoard>, y: usize) -> String {
        String::from_utf8(node.display().cache().row(y).unwrap().to_vec()).unwrap()
    }

    #[test]
    fn test_init_powers_on_and_samples() {
        let node = booted();
        let parts = node.collaborators();
        assert!(parts.particulate.powered);
        assert!(parts.position.powered);
        assert_eq!(parts.cloud.subscriptions, [LEVELS_RESPONSE_EVENT]);
        assert_eq!(node.context().snapshot.gas, Some(GasReading { voc: 120, co2: 612 }));

        assert!(row(&node, 0).starts_with("PM ["));
        assert!(row(&node, 1).ends_with(" 612"));
        assert_eq!(&row(&node, 2)[..9], "23.4C 45%");
        assert_eq!(&row(&node, 2)[10..], "    NO GPS");
        assert_eq!(&row(&node, 3)[..2], "OK");
        assert_eq!(&row(&node, 3)[15..], "--:--");
    }

    #[test]
    fn test_idle_services_collaborators() {
        let mut node = booted();
        node.tick(20);
        node.tick(30);
        assert_eq!(node.collaborators().particulate.serviced, 2);
        assert_eq!(node.state(), State::Idle);
    }

    #[test]
    fn test_sleep_preferred_over_due_publish() {
        let mut node = booted();
        node.collaborators_mut().cloud.connected = true;
        node.collaborators_mut().platform.ignition = false;

        node.tick(120_000);
        assert_eq!(node.state(), State::Sleep);

        let tick = node.tick(120_010);
        assert_eq!(
            tick,
            Tick::Sleep(WakeCondition {
                ignition_rising: true,
                check_interval_ms: None,
            })
        );
        assert!(node.collaborators().cloud.published.is_empty());
    }

    #[test]
    fn test_sleep_powers_everything_down() {
        let mut node = booted();
        node.collaborators_mut().platform.ignition = false;
        node.tick(20);
        node.tick(30);

        let parts = node.collaborators();
        assert!(!parts.particulate.powered);
        assert!(!parts.climate.powered);
        assert!(!parts.gas.powered);
        assert!(!parts.position.powered);
        assert!(!node.display().radio().powered);
        assert!(row(&node, 0).starts_with("Powering down"));
        assert!(!node.display().cache().flash().is_enabled());
    }

    #[test]
    fn test_sample_trigger_ignored_while_asleep() {
        let mut node = booted();
        node.collaborators_mut().platform.ignition = false;
        node.tick(20);
        node.trigger_sample();
        assert!(matches!(node.tick(30), Tick::Sleep(_)));
        assert_eq!(node.state(), State::Sleep);

        node.collaborators_mut().platform.ignition = true;
        node.wake();
        assert_eq!(node.state(), State::Init);
        // A trigger raised during sleep must not skip power-up
        node.trigger_sample();
        node.tick(40);
        assert_eq!(node.state(), State::Sample);
        assert!(node.collaborators().particulate.powered);
    }

    #[test]
    fn test_sample_trigger_from_idle() {
        let mut node = booted();
        node.collaborators_mut().gas.reading = Ok(GasReading { voc: 100, co2: 700 });
        node.trigger_sample();
        node.tick(2_000);
        assert_eq!(node.state(), State::Idle);
        assert!(row(&node, 1).ends_with(" 700"));
    }

    #[test]
    fn test_distance_triggers_early_publish() {
        let mut node = booted();
        node.collaborators_mut().cloud.connected = true;
        node.collaborators_mut().position.fix = valid_fix(0.6);

        node.trigger_sample();
        node.tick(2_000);
        assert!(node.context().distance_due);
        node.tick(2_010);
        assert_eq!(node.state(), State::Publish);
        node.tick(2_020);

        let cloud = &node.collaborators().cloud;
        let pushed = cloud.events(PUBLISH_EVENT);
        assert_eq!(pushed.len(), 1);
        assert!(pushed[0].contains("\"lat\":56.436935"));
        assert!(pushed[0].contains("\"time\":\"2024-11-26 13:50:30\""));
        assert_eq!(node.collaborators().position.resets, 1);
        assert!(!node.context().distance_due);
    }

    #[test]
    fn test_distance_ignored_without_fix() {
        let mut node = booted();
        let mut fix = valid_fix(5.0);
        fix.validity = Validity::Searching;
        node.collaborators_mut().position.fix = fix;
        node.trigger_sample();
        node.tick(2_000);
        node.tick(2_010);
        assert!(!node.context().distance_due);
        assert_eq!(node.state(), State::Idle);
        assert_eq!(&row(&node, 2)[10..], "    NO FIX");
    }

    #[test]
    fn test_publish_deferred_until_connected() {
        let mut node = booted();
        node.tick(60_000);
        assert_eq!(node.state(), State::Publish);
        node.tick(60_010);
        assert_eq!(node.state(), State::Idle);
        assert_eq!(node.collaborators().cloud.connect_requests, 1);
        assert!(node.collaborators().cloud.published.is_empty());

        // Still due; retried once the transport is up
        node.collaborators_mut().cloud.connected = true;
        node.tick(60_020);
        assert_eq!(node.state(), State::Publish);
        node.tick(60_030);
        assert_eq!(node.collaborators().cloud.events(PUBLISH_EVENT).len(), 1);
        assert_eq!(node.context().last_publish_ms, 60_030);
    }

    #[test]
    fn test_publish_keeps_last_good_values() {
        let mut node = booted();
        node.collaborators_mut().particulate.reading = Err(SensorError::Checksum);
        node.trigger_sample();
        node.tick(2_000);
        assert_eq!(node.context().snapshot.particulate, Some(CLEAN_AIR));

        node.collaborators_mut().cloud.connected = true;
        node.tick(60_000);
        node.tick(60_010);
        let pushed = node.collaborators().cloud.events(PUBLISH_EVENT);
        assert!(pushed[0].starts_with("{\"pm1\":3.0,\"pm25\":5.0,\"pm4\":6.0,\"pm10\":7.0,"));
        assert!(pushed[0].ends_with("\"time\":\"0000-00-00 00:00:00\"}"));
    }

    #[test]
    fn test_levels_requested_and_applied() {
        let mut node = booted();
        node.collaborators_mut().cloud.connected = true;
        node.tick(60_000);
        node.tick(60_010);
        // First publish after boot also refreshes the averages
        assert_eq!(node.state(), State::Levels);
        node.tick(60_020);
        assert_eq!(node.state(), State::Idle);
        assert_eq!(node.collaborators().cloud.events(LEVELS_REQUEST_EVENT), [""]);
        assert_eq!(node.context().levels_pending_since, Some(60_020));

        node.collaborators_mut().cloud.respond(
            "hook-response/airfleet_levels/0",
            r#"{"co2":"800.0","pm1":"2.0","pm25":"4.0","pm4":"5.0","pm10":"6.0"}"#,
        );
        node.tick(60_030);
        let ctx = node.context();
        assert_eq!(ctx.averages.co2, 800.0);
        assert_eq!(ctx.averages.particulate, [2.0, 4.0, 5.0, 6.0]);
        assert_eq!(ctx.levels_pending_since, None);
        assert!(!node.collaborators().cloud.connected);

        // The next sample redraws the gauges against the new reference
        node.trigger_sample();
        node.tick(62_000);
        assert_eq!(row(&node, 1).as_str(), "CO2[-- |      ]  612");
    }

    #[test]
    fn test_publish_without_levels_disconnects() {
        let mut node = booted();
        node.collaborators_mut().cloud.connected = true;
        node.tick(60_000);
        node.tick(60_010);
        node.tick(60_020);
        node.collaborators_mut()
            .cloud
            .respond("hook-response/airfleet_levels/0", r#"{"co2":"800.0"}"#);
        node.tick(60_030);

        node.collaborators_mut().cloud.connected = true;
        node.tick(120_030);
        assert_eq!(node.state(), State::Publish);
        assert_eq!(node.tick(120_040), Tick::Continue);
        assert_eq!(node.state(), State::Idle);
        assert!(!node.collaborators().cloud.connected);
        assert_eq!(node.collaborators().cloud.events(LEVELS_REQUEST_EVENT).len(), 1);
    }

    #[test]
    fn test_levels_timeout_disconnects_and_retries() {
        let mut node = booted();
        node.collaborators_mut().cloud.connected = true;
        node.tick(60_000);
        node.tick(60_010);
        node.tick(60_020);
        let disconnects = node.collaborators().cloud.disconnects;

        node.tick(90_020);
        assert_eq!(node.context().levels_pending_since, None);
        assert_eq!(node.collaborators().cloud.disconnects, disconnects + 1);
        assert!(node.context().levels_due(90_020, &node.config().levels));
    }

    #[test]
    fn test_malformed_levels_leave_averages() {
        let mut node = booted();
        node.collaborators_mut()
            .cloud
            .respond("hook-response/airfleet_levels/0", "not json");
        node.collaborators_mut().cloud.respond("unrelated", "{}");
        node.tick(20);
        assert_eq!(node.context().averages.co2, 0.0);
    }

    #[test]
    fn test_alert_flashes_and_clears() {
        let mut node = booted();
        node.collaborators_mut().gas.reading = Ok(GasReading { voc: 0, co2: 1_600 });
        node.trigger_sample();
        node.tick(2_000);

        let flash = node.display().cache().flash().clone();
        assert!(flash.is_enabled());
        assert_eq!(&flash.text[..], b"HIGH CO2");
        assert_eq!(flash.interval_ms, 500);
        assert_eq!((flash.x, flash.y), (0, 3));
        assert_eq!(&row(&node, 3)[..14], "              ");

        node.collaborators_mut().gas.reading = Ok(GasReading { voc: 0, co2: 600 });
        node.trigger_sample();
        node.tick(4_000);
        assert!(!node.display().cache().flash().is_enabled());
        assert_eq!(&row(&node, 3)[..2], "OK");
    }

    #[test]
    fn test_clock_follows_fix_time() {
        let mut node = booted();
        node.collaborators_mut().position.fix = valid_fix(0.0);
        node.trigger_sample();
        node.tick(2_000);
        assert_eq!(&row(&node, 3)[15..], "13:50");
        assert_eq!(&row(&node, 2)[10..], "  52.3km/h");
    }

    #[test]
    fn test_subscribe_once_across_sleep() {
        let mut node = booted();
        node.collaborators_mut().platform.ignition = false;
        node.tick(20);
        node.tick(30);
        node.collaborators_mut().platform.ignition = true;
        node.wake();
        node.tick(40);
        assert_eq!(node.collaborators().cloud.subscriptions.len(), 1);
    }

    #[test]
    fn test_failed_sensor_skipped() {
        let mut node = node();
        node.collaborators_mut().climate.reading = Err(SensorError::Bus);
        node.tick(0);
        node.tick(10);
        assert_eq!(node.state(), State::Idle);
        assert_eq!(node.context().snapshot.climate, None);
        assert_eq!(node.context().snapshot.particulate, Some(CLEAN_AIR));

        assert!(row(&node, 0).starts_with("PM ["));
        assert!(row(&node, 1).ends_with(" 612"));
        assert_eq!(&row(&node, 2)[..9], "         ");

        node.collaborators_mut().cloud.connected = true;
        node.tick(60_000);
        assert_eq!(node.state(), State::Publish);
        node.tick(60_010);
        let pushed = node.collaborators().cloud.events(PUBLISH_EVENT);
        assert_eq!(pushed.len(), 1);
        assert!(pushed[0].starts_with("{\"pm1\":3.0,\"pm25\":5.0,"));
        assert!(pushed[0].contains("\"temp\":0.0,\"humi\":0.0,\"voc\":120,\"co2\":612,"));
    }

    #[test]
    fn test_wake_keeps_publish_schedule() {
        let mut node = booted();
        node.collaborators_mut().platform.ignition = false;
        node.tick(20);
        assert!(matches!(node.tick(30), Tick::Sleep(_)));

        node.collaborators_mut().platform.ignition = true;
        node.wake();
        node.tick(50_000);
        node.tick(50_010);
        assert_eq!(node.state(), State::Idle);
        assert_eq!(node.context().last_publish_ms, 0);

        // Due one interval after boot, not after the wake
        node.tick(60_000);
        assert_eq!(node.state(), State::Publish);
    }
}
