//! Generates request delegates for this crate's endpoints.

fn main() {
    if let Err(err) = daedalus_gen::build_script::generate() {
        panic!("daedalus-gen failed: {err}");
    }
}
