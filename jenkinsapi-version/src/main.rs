#![deny(unsafe_code)]

use jenkinsapi_common::jenkinsapi_common_version;

/// Print our version, with no trailing newline, and exit.
fn main() {
    print!("{}", jenkinsapi_common_version());
}
