//! dynamic-gatt firmware entry point (nRF52840 + SoftDevice S140).
//!
//! Enables the SoftDevice, feeds the boot event to the application (which
//! registers the GATT database and requests advertising), then loops:
//! advertise, serve one connection, report the disconnect.
//!
//! Any error returned by the application is fatal and halts the firmware.

#![no_std]
#![no_main]

mod softdevice;

use defmt::{info, unwrap, Debug2Format};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::interrupt::Priority;
use embassy_time as _;
use nrf_softdevice::ble::gatt_server;
use nrf_softdevice::ble::peripheral::{self, ConnectableAdvertisement};
use nrf_softdevice::{raw, Softdevice};
use panic_probe as _;

use dynamic_gatt::adv_data::AdvertisingData;
use dynamic_gatt::config::{ADV_SET_COUNT, ATTR_TAB_SIZE, ATT_MTU, CONN_COUNT, CONN_EVENT_LENGTH};
use dynamic_gatt::event::connection_id;
use dynamic_gatt::{App, BootInfo, Event};
use softdevice::{DynamicServer, SoftdeviceStack};

// ═══════════════════════════════════════════════════════════════════════════
// Entry
// ═══════════════════════════════════════════════════════════════════════════

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("dynamic-gatt starting");

    // Keep clear of the priority levels reserved by the SoftDevice (0, 1, 4).
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let _p = embassy_nrf::init(nrf_config);

    let sd: &'static Softdevice = Softdevice::enable(&softdevice_config());
    info!("SoftDevice enabled");

    let mut app = App::new();
    let mut stack = SoftdeviceStack::new();
    let boot = Event::SystemBoot(BootInfo {
        major: raw::SD_MAJOR_VERSION as u16,
        minor: raw::SD_MINOR_VERSION as u16,
        patch: raw::SD_BUGFIX_VERSION as u16,
    });
    dispatch(&mut app, &mut stack, &boot);

    let server = match app.database() {
        Some(db) => DynamicServer::new(db.clone()),
        None => defmt::panic!("boot finished without a GATT database"),
    };
    let adv_data = match AdvertisingData::for_device() {
        Ok(data) => data,
        Err(e) => defmt::panic!("advertising payload: {}", e),
    };

    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(ble_task(sd, app, stack, server, adv_data)));
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: CONN_COUNT,
            event_length: CONN_EVENT_LENGTH,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: ATT_MTU }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: ATTR_TAB_SIZE,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: ADV_SET_COUNT,
            periph_role_count: CONN_COUNT,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        ..Default::default()
    }
}

/// Run one event through the application; a failure halts.
fn dispatch(app: &mut App, stack: &mut SoftdeviceStack, event: &Event) {
    if let Err(e) = app.on_event(stack, event) {
        defmt::panic!("event {:#x}: {}", event.id(), e);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tasks
// ═══════════════════════════════════════════════════════════════════════════

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn ble_task(
    sd: &'static Softdevice,
    mut app: App,
    mut stack: SoftdeviceStack,
    server: DynamicServer,
    adv_data: AdvertisingData,
) {
    loop {
        let Some(request) = stack.take_advertising() else {
            defmt::panic!("no advertising requested in state {}", app.state());
        };

        let advertisement = ConnectableAdvertisement::ScannableUndirected {
            adv_data: &adv_data.adv,
            scan_data: &adv_data.scan_response,
        };
        let conn = match peripheral::advertise_connectable(sd, advertisement, &request.config()).await {
            Ok(conn) => conn,
            Err(e) => defmt::panic!("advertising failed: {:?}", Debug2Format(&e)),
        };

        let Some(connection) = connection_id(conn.handle()) else {
            defmt::panic!("connection without a usable handle: {:?}", conn.handle());
        };
        dispatch(
            &mut app,
            &mut stack,
            &Event::ConnectionOpened {
                connection,
                advertiser: Some(request.set),
            },
        );

        // Returns once the central disconnects.
        let e = gatt_server::run(&conn, &server, |_| {}).await;
        info!("gatt_server exited: {:?}", Debug2Format(&e));

        dispatch(
            &mut app,
            &mut stack,
            &Event::ConnectionClosed {
                connection,
                reason: None,
            },
        );
    }
}
