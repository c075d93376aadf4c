mod common;

use common::{endpoint, pen};
use xpboard::tablet::{UsbId, DIGITIZER_USAGE_PAGE, PEN_TABLET_6IN, STAR_G640, XP_PEN_VENDOR};
use xpboard::{Backend, Builder, ConnectError, ScriptedTransport, TransportError};

const KEYBOARD_PAGE: u16 = 0x0001;
const VENDOR_PAGE: u16 = 0xFF0A;

fn three_endpoints() -> Vec<xpboard::tablet::DeviceDescriptor> {
    vec![
        endpoint("kbd", STAR_G640, KEYBOARD_PAGE),
        endpoint("pen", STAR_G640, DIGITIZER_USAGE_PAGE),
        endpoint("vendor", STAR_G640, VENDOR_PAGE),
    ]
}

#[test]
fn digitizer_is_picked_even_when_not_first() {
    let (transport, feed) = ScriptedTransport::new(three_endpoints());
    let mut board = Builder::new().build_scripted(transport).unwrap();
    assert_eq!(board.backed(), Backend::Scripted);

    let connected = board.connect().unwrap();
    assert_eq!(connected.path, "pen");
    assert!(connected.is_digitizer());
    assert_eq!(feed.open_attempts(), ["pen"]);
}

#[test]
fn fallback_in_enumeration_order() {
    let (transport, feed) = ScriptedTransport::new(three_endpoints());
    let mut board = Builder::new()
        .build_scripted(transport.refuse("pen"))
        .unwrap();
    assert_eq!(board.connect().unwrap().path, "kbd");
    assert_eq!(feed.open_attempts(), ["pen", "kbd"]);
}

#[test]
fn open_failed_carries_the_last_error() {
    let (transport, feed) = ScriptedTransport::new(three_endpoints());
    let transport = transport.refuse("pen").refuse("kbd").refuse("vendor");
    let mut board = Builder::new().build_scripted(transport).unwrap();

    let (attempts, last) = match board.connect() {
        Err(ConnectError::OpenFailed { attempts, last }) => (attempts, last),
        other => panic!("expected OpenFailed, got {other:?}"),
    };
    assert_eq!(attempts, 3);
    assert!(matches!(last, TransportError::Open { ref path, .. } if path == "vendor"));
    assert_eq!(feed.open_attempts(), ["pen", "kbd", "vendor"]);

    // Still a perfectly good canvas.
    assert!(board.snapshot().is_empty());
    board.clear();
}

#[test]
fn nothing_found() {
    let stranger = UsbId {
        vid: 0x056A,
        pid: 0x0094,
    };
    let (transport, feed) =
        ScriptedTransport::new(vec![endpoint("other", stranger, DIGITIZER_USAGE_PAGE)]);
    let mut board = Builder::new().build_scripted(transport).unwrap();

    let err = board.connect().unwrap_err();
    assert!(matches!(
        err,
        ConnectError::DeviceNotFound { vendor: XP_PEN_VENDOR, ref products } if products == &[0x0094, 0x0914]
    ));
    assert!(feed.open_attempts().is_empty());
}

#[test]
fn both_known_products_are_tried() {
    let six_inch = endpoint("six", PEN_TABLET_6IN, DIGITIZER_USAGE_PAGE);
    let (transport, _feed) = ScriptedTransport::new(vec![six_inch]);
    let mut board = Builder::new().build_scripted(transport).unwrap();
    assert_eq!(board.connect().unwrap().usb_id, PEN_TABLET_6IN);
}

#[test]
fn digitizer_preferred_across_products() {
    let (transport, _feed) = ScriptedTransport::new(vec![
        endpoint("g640-kbd", STAR_G640, KEYBOARD_PAGE),
        endpoint("six-pen", PEN_TABLET_6IN, DIGITIZER_USAGE_PAGE),
    ]);
    let mut board = Builder::new().build_scripted(transport).unwrap();
    assert_eq!(board.connect().unwrap().path, "six-pen");
}

#[test]
fn any_product_mode() {
    let unknown = UsbId {
        vid: XP_PEN_VENDOR,
        pid: 0x1234,
    };
    let descriptors = vec![endpoint("deco", unknown, DIGITIZER_USAGE_PAGE)];

    let (transport, _feed) = ScriptedTransport::new(descriptors.clone());
    let mut strict = Builder::new().build_scripted(transport).unwrap();
    assert!(matches!(
        strict.connect(),
        Err(ConnectError::DeviceNotFound { .. })
    ));

    let (transport, _feed) = ScriptedTransport::new(descriptors);
    let mut loose = Builder::new()
        .any_product(true)
        .build_scripted(transport)
        .unwrap();
    assert_eq!(loose.connect().unwrap().path, "deco");
}

#[test]
fn list_devices_ignores_product() {
    let unknown = UsbId {
        vid: XP_PEN_VENDOR,
        pid: 0x1234,
    };
    let (transport, _feed) = ScriptedTransport::new(vec![
        pen("pen"),
        endpoint("deco", unknown, KEYBOARD_PAGE),
        endpoint("wacom", UsbId { vid: 0x056A, pid: 1 }, DIGITIZER_USAGE_PAGE),
    ]);
    let mut board = Builder::new().build_scripted(transport).unwrap();
    let paths: Vec<_> = board
        .list_devices()
        .unwrap()
        .into_iter()
        .map(|d| d.path)
        .collect();
    assert_eq!(paths, ["pen", "deco"]);
}

#[test]
fn reconnect_after_stop_reports_busy_endpoint() {
    let (transport, _feed) = ScriptedTransport::new(vec![pen("pen")]);
    let mut board = Builder::new().build_scripted(transport).unwrap();
    board.connect().unwrap();
    board.stop_input();
    // The scripted transport only ever hands out one handle.
    assert!(matches!(
        board.connect(),
        Err(ConnectError::OpenFailed {
            attempts: 1,
            last: TransportError::Busy
        })
    ));
}
