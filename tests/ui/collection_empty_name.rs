#[mmg_typereg::collection(name = "  ")]
pub struct Plugins;

fn main() {
    let _ = Plugins;
}
