//! SwoopChirpDds - Main entry point
//!
//! Target (ESP32-S3):
//! 1. Bring up the log UART
//! 2. Build every table into static storage
//! 3. Bring up SPI DAC, probe pin and the one-shot alarm
//! 4. Move the engine into its static cell and arm the alarm
//! 5. Idle loop: drain logs, report diagnostics
//!
//! Host: dry run of two cycles against simulated peripherals.

#![cfg_attr(target_os = "espidf", no_std)]
#![cfg_attr(target_os = "espidf", no_main)]

#[cfg(target_os = "espidf")]
mod firmware {
    use core::cell::UnsafeCell;
    use core::ffi::c_void;

    use esp_idf_svc::hal::gpio::AnyIOPin;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::sys as esp_idf_sys;

    use swoop_chirp_dds::{
        config::{PinConfig, SequencingPolicy, CONFIG},
        dds::{Program, SegmentedStorage, SineTable, TableBuilder},
        fault::Diagnostics,
        hal::{self, DacBus, DacCs, EspAlarm, HalError, ProbePin},
        rt_error, rt_info, rt_warn,
        uart_logger::{drain_to_uart, init_uart_logger, UartLoggerConfig},
        Synth, BG_LOG_STREAM, RT_LOG_STREAM,
    };

    // Wrapper to make UnsafeCell Sync for static storage.
    // SAFETY: startup is the only writer before the alarm is armed, the alarm
    // callback is the only user afterwards.
    #[repr(transparent)]
    struct SyncCell<T>(UnsafeCell<T>);
    unsafe impl<T> Sync for SyncCell<T> {}

    impl<T> SyncCell<T> {
        const fn new(value: T) -> Self {
            Self(UnsafeCell::new(value))
        }

        fn get(&self) -> *mut T {
            self.0.get()
        }
    }

    type Engine = Synth<'static, DacBus, DacCs, ProbePin, EspAlarm>;

    // Storage for the compiled-in policy only; the other layout gets length 0.
    const SEGMENTED: bool = matches!(CONFIG.policy, SequencingPolicy::Segmented);
    const SWOOP_LEN: usize = if SEGMENTED { CONFIG.swoop.samples } else { 0 };
    const CHIRP_LEN: usize = if SEGMENTED { CONFIG.chirp.samples } else { 0 };
    const SONG_LEN: usize = if SEGMENTED { 0 } else { CONFIG.song_samples() };

    static SWOOP_INCREMENTS: SyncCell<[u32; SWOOP_LEN]> = SyncCell::new([0; SWOOP_LEN]);
    static SWOOP_ENVELOPE: SyncCell<[f32; SWOOP_LEN]> = SyncCell::new([0.0; SWOOP_LEN]);
    static CHIRP_INCREMENTS: SyncCell<[u32; CHIRP_LEN]> = SyncCell::new([0; CHIRP_LEN]);
    static CHIRP_ENVELOPE: SyncCell<[f32; CHIRP_LEN]> = SyncCell::new([0.0; CHIRP_LEN]);
    static SONG: SyncCell<[u16; SONG_LEN]> = SyncCell::new([0; SONG_LEN]);

    static ENGINE: SyncCell<Option<Engine>> = SyncCell::new(None);
    static DIAGNOSTICS: Diagnostics = Diagnostics::new();

    /// Status report period for the idle loop (µs)
    const STATUS_PERIOD_US: i64 = 5_000_000;

    fn timestamp_us() -> u64 {
        // SAFETY: always safe to call
        unsafe { esp_idf_sys::esp_timer_get_time() as u64 }
    }

    /// Alarm callback: one engine step.
    unsafe extern "C" fn on_alarm(_arg: *mut c_void) {
        // SAFETY: ENGINE is filled before the alarm is armed and only this
        // callback touches it afterwards. esp_timer never runs a callback
        // re-entrantly.
        if let Some(engine) = unsafe { (*ENGINE.get()).as_mut() } {
            engine.tick();
        }
    }

    /// Build tables into the static storage. Runs before anything is armed.
    fn build_program(builder: &TableBuilder<'_>, sine: &SineTable) -> Result<Program<'static>, HalError> {
        // SAFETY: called once from startup; the alarm is not armed yet, so
        // nothing else can observe the storage.
        let program = unsafe {
            match CONFIG.policy {
                SequencingPolicy::Segmented => builder.build_segmented(SegmentedStorage {
                    swoop_increments: &mut *SWOOP_INCREMENTS.get(),
                    swoop_envelope: &mut *SWOOP_ENVELOPE.get(),
                    chirp_increments: &mut *CHIRP_INCREMENTS.get(),
                    chirp_envelope: &mut *CHIRP_ENVELOPE.get(),
                })?,
                SequencingPolicy::Concatenated => builder.render_song(sine, &mut *SONG.get())?,
            }
        };
        Ok(program)
    }

    fn start_engine(peripherals: Peripherals, pins: &PinConfig) -> Result<(), HalError> {
        let builder = TableBuilder::new(&CONFIG)?;
        let sine: SineTable = builder.sine_table();
        let program = build_program(&builder, &sine)?;

        rt_info!(
            BG_LOG_STREAM,
            timestamp_us(),
            "tables built: {:?}, swoop {} / chirp {} samples, {} Hz",
            program.policy(),
            CONFIG.swoop.samples,
            CONFIG.chirp.samples,
            CONFIG.sample_rate_hz
        );

        let dac = hal::init_dac(peripherals.spi2, pins)?;
        let probe = hal::init_probe(pins)?;
        let alarm = EspAlarm::new(on_alarm)?;

        let engine = Synth::new(
            &CONFIG,
            program,
            sine,
            dac,
            probe,
            alarm,
            &DIAGNOSTICS,
            &RT_LOG_STREAM,
        );

        // SAFETY: alarm not armed yet, this is the only reference.
        let engine = unsafe { (*ENGINE.get()).insert(engine) };
        engine.start()?;
        // The alarm context owns the engine from here on.
        Ok(())
    }

    fn report_status(now: u64) {
        let snap = DIAGNOSTICS.snapshot();
        rt_info!(
            BG_LOG_STREAM,
            now,
            "cycles={} words={} late={} bus_errors={} alarms={}",
            snap.cycles,
            snap.words,
            snap.missed_deadlines,
            snap.bus_errors,
            snap.alarm_failures
        );
        if snap.active {
            rt_warn!(BG_LOG_STREAM, now, "last fault {:?} ({})", snap.code, snap.data);
            DIAGNOSTICS.clear();
        }
    }

    #[no_mangle]
    fn main() {
        // Initialize ESP-IDF
        esp_idf_sys::link_patches();

        let Ok(peripherals) = Peripherals::take() else {
            return;
        };

        let pins = PinConfig::DEFAULT;
        let uart_config = UartLoggerConfig::default();
        // SAFETY: log TX pin is dedicated to the UART.
        let tx_pin = unsafe { AnyIOPin::new(uart_config.tx_pin as i32) };
        let mut uart = match init_uart_logger(peripherals.uart1, tx_pin, &uart_config) {
            Ok(uart) => uart,
            Err(_) => return,
        };

        rt_info!(BG_LOG_STREAM, timestamp_us(), "{}", env!("VERSION_STRING"));

        if let Err(err) = start_engine(peripherals, &pins) {
            rt_error!(BG_LOG_STREAM, timestamp_us(), "startup failed: {}", err);
        }

        let mut last_status = 0i64;
        loop {
            let work_done = drain_to_uart(&mut uart);

            let now = timestamp_us();
            if now as i64 - last_status > STATUS_PERIOD_US {
                report_status(now);
                last_status = now as i64;
            }

            if !work_done {
                unsafe {
                    esp_idf_sys::vTaskDelay(10);
                }
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    use std::io::Write;

    use swoop_chirp_dds::{
        dds::{SegmentedStorage, TableBuilder},
        fault::Diagnostics,
        sim::{SimDac, SimPin, SimTimer},
        uart_logger::drain_stream,
        AlarmTimer, DacWriter, SequencingPolicy, SineTable, Synth, TickOutcome, CONFIG,
        RT_LOG_STREAM,
    };

    const CYCLES: usize = 2;

    let builder = match TableBuilder::new(&CONFIG) {
        Ok(builder) => builder,
        Err(err) => {
            eprintln!("invalid configuration: {}", err);
            std::process::exit(1);
        }
    };
    let sine: SineTable = builder.sine_table();

    let mut swoop_increments = vec![0u32; CONFIG.swoop.samples];
    let mut swoop_envelope = vec![0f32; CONFIG.swoop.samples];
    let mut chirp_increments = vec![0u32; CONFIG.chirp.samples];
    let mut chirp_envelope = vec![0f32; CONFIG.chirp.samples];
    let mut song = vec![0u16; CONFIG.song_samples()];

    let program = match CONFIG.policy {
        SequencingPolicy::Segmented => builder.build_segmented(SegmentedStorage {
            swoop_increments: &mut swoop_increments,
            swoop_envelope: &mut swoop_envelope,
            chirp_increments: &mut chirp_increments,
            chirp_envelope: &mut chirp_envelope,
        }),
        SequencingPolicy::Concatenated => builder.render_song(&sine, &mut song),
    };
    let program = match program {
        Ok(program) => program,
        Err(err) => {
            eprintln!("table build failed: {}", err);
            std::process::exit(1);
        }
    };

    let diagnostics = Diagnostics::new();
    let dac = match DacWriter::new(SimDac::new(), SimPin::new()) {
        Ok(dac) => dac,
        Err(err) => {
            eprintln!("dac: {}", err);
            std::process::exit(1);
        }
    };
    let mut synth = Synth::new(
        &CONFIG,
        program,
        sine,
        dac,
        SimPin::new(),
        SimTimer::new(0),
        &diagnostics,
        &RT_LOG_STREAM,
    );

    if let Err(err) = synth.start() {
        eprintln!("start failed: {}", err);
        std::process::exit(1);
    }
    let ticks = synth.ticks_per_cycle() * CYCLES;
    let mut boundaries = 0;
    for _ in 0..ticks {
        if synth.timer_mut().fire().is_none() {
            break;
        }
        if matches!(synth.tick(), TickOutcome::CycleEnd) {
            boundaries += 1;
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    drain_stream(&RT_LOG_STREAM, |line| {
        let _ = out.write_all(line);
    });

    let elapsed_us = synth.timer().now();
    let (dac, probe, _) = synth.release();
    let (bus, _) = dac.release();
    let snap = diagnostics.snapshot();
    let _ = writeln!(
        out,
        "{:?}: {} cycles, {} words ({} on bus), {} boundaries, {} probe pulses, {:.3} s simulated, range {:?}",
        CONFIG.policy,
        snap.cycles,
        snap.words,
        bus.words(),
        boundaries,
        probe.rising_edges(),
        elapsed_us as f64 / 1e6,
        bus.magnitude_range()
    );
}
