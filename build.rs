use cfg_aliases::cfg_aliases;

fn main() {
    // The script doesn't depend on our code
    println!("cargo:rerun-if-changed=build.rs");
    // But it *does* depend on cfgs!
    println!("cargo:rerun-if-env-changed=RUSTFLAGS");
    println!("cargo:rerun-if-env-changed=RUSTDOCFLAGS");

    cfg_aliases! {
        // hidapi backend is requested and hidapi supports the target.
        hid_backend: { all(feature = "hidapi-backend", any(docsrs, target_os = "linux", target_os = "windows", target_os = "macos", target_os = "freebsd")) },
    }
}
