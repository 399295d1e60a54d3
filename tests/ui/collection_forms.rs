use mmg_typereg::CollectionBase;

pub trait Plugin {}

#[mmg_typereg::collection(name = "plugins", by_id, accessors = false)]
pub struct Plugins;
impl CollectionBase<dyn Plugin> for Plugins {}

#[mmg_typereg::transitive_collection("all_plugins", return_type = dyn Plugin)]
pub struct AllPlugins<T: Plugin + ?Sized>(std::marker::PhantomData<T>);

#[mmg_typereg::collection(name = "plugin_kinds")]
pub enum PluginKinds {}

#[mmg_typereg::collection(name = "as_trait")]
pub trait PluginFamily: CollectionBase<dyn Plugin> {}

fn main() {
    let _ = Plugins;
    let _ = AllPlugins::<dyn Plugin>(std::marker::PhantomData);
}
