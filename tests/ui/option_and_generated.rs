pub trait Codec {}

#[mmg_typereg::registry_option(name = "gzip", id = 7)]
#[derive(Default)]
pub struct Gzip;
impl Codec for Gzip {}

#[mmg_typereg::registry_option]
pub enum Raw {
    Plain,
}
impl Codec for Raw {}

#[mmg_typereg::generated]
pub struct CodecsRegistry;

fn main() {
    let _ = (Gzip, Raw::Plain, CodecsRegistry);
}
