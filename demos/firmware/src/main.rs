//! # rrtos demo firmware
//!
//! Three background threads and two periodic events exercising the
//! round-robin kernel end to end: thread admission, round-robin scheduling,
//! `sleep`, and staggered periodic dispatch.
//!
//! | Thread | Behavior |
//! |--------|----------|
//! | `heartbeat_thread` | Toggles a GPIO pin, sleeps 500 ticks |
//! | `counter_thread` | Increments a counter, sleeps 200 ticks |
//! | `idle_thread` | Never sleeps — always runnable, soaks remaining slices |
//!
//! | Periodic event | Period | Behavior |
//! |-----------------|--------|----------|
//! | `sample_tick` | 100 ticks | Increments a sample counter |
//! | `watchdog_tick` | 1000 ticks | Toggles a watchdog-kick pin |

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use panic_halt as _;

use rrtos::kernel;

// ---------------------------------------------------------------------------
// Fake GPIO — stands in for a board support package this demo doesn't carry.
// ---------------------------------------------------------------------------

const GPIO_OUT: *mut u32 = 0x4000_0000 as *mut u32;

fn toggle_gpio_bit(bit: u32) {
    unsafe {
        let val = core::ptr::read_volatile(GPIO_OUT);
        core::ptr::write_volatile(GPIO_OUT, val ^ (1 << bit));
    }
}

// ---------------------------------------------------------------------------
// Thread entry points
// ---------------------------------------------------------------------------

/// Toggles a GPIO pin every 500 ticks, then sleeps until the next toggle.
extern "C" fn heartbeat_thread() -> ! {
    loop {
        toggle_gpio_bit(1);
        kernel::sleep(500);
    }
}

/// Background counter, woken every 200 ticks.
extern "C" fn counter_thread() -> ! {
    let mut count: u32 = 0;
    loop {
        count = count.wrapping_add(1);
        kernel::sleep(200);
    }
}

/// Never sleeps or blocks — always runnable, so the ready ring always has at
/// least one thread to schedule even while the other two are asleep.
extern "C" fn idle_thread() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

// ---------------------------------------------------------------------------
// Periodic events
// ---------------------------------------------------------------------------

static mut SAMPLE_COUNT: u32 = 0;

/// Runs every 100 ticks in SysTick-interrupt context.
extern "C" fn sample_tick() {
    unsafe {
        SAMPLE_COUNT = SAMPLE_COUNT.wrapping_add(1);
    }
}

/// Runs every 1000 ticks in SysTick-interrupt context.
extern "C" fn watchdog_tick() {
    toggle_gpio_bit(2);
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Firmware entry point. Admits threads and periodic events, then launches
/// the kernel. Does not return.
#[entry]
fn main() -> ! {
    let cp = cortex_m::Peripherals::take().unwrap();

    kernel::init();

    kernel::add_thread(heartbeat_thread).expect("failed to admit heartbeat_thread");
    kernel::add_thread(counter_thread).expect("failed to admit counter_thread");
    kernel::add_thread(idle_thread).expect("failed to admit idle_thread");

    kernel::add_periodic_event(sample_tick, 100).expect("failed to admit sample_tick");
    kernel::add_periodic_event(watchdog_tick, 1000).expect("failed to admit watchdog_tick");

    // 16 MHz system clock, by way of illustration — a real board brings up
    // its clock tree before this point and passes the resulting frequency.
    let error = kernel::launch(cp, 16_000_000);
    panic!("launch returned: {error}");
}
