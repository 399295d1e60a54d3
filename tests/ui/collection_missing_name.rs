#[mmg_typereg::collection(by_id)]
pub struct Plugins;

fn main() {
    let _ = Plugins;
}
