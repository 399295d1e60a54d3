// @generated by mmg-typereg. Do not edit.
///Registry `shapes` over options of `shapes::IShape` (declared on `shapes::Shapes`).
#[::mmg_typereg::generated]
pub struct ShapesRegistry;
impl ShapesRegistry {
    pub const NAMES: &'static [&'static str] = &["Circle", "Square"];
    pub fn all() -> ::std::vec::Vec<::std::boxed::Box<dyn shapes::IShape>> {
        ::std::vec![
            ::std::boxed::Box::new(shapes::Circle::new(1.0)) as
            ::std::boxed::Box<dyn shapes::IShape>,
            ::std::boxed::Box::new(shapes::Square::new()) as
            ::std::boxed::Box<dyn shapes::IShape>
        ]
    }
    pub fn by_name(
        name: &str,
    ) -> ::core::option::Option<::std::boxed::Box<dyn shapes::IShape>> {
        match name {
            "Circle" => {
                ::core::option::Option::Some(
                    ::std::boxed::Box::new(shapes::Circle::new(1.0))
                        as ::std::boxed::Box<dyn shapes::IShape>,
                )
            }
            "Square" => {
                ::core::option::Option::Some(
                    ::std::boxed::Box::new(shapes::Square::new())
                        as ::std::boxed::Box<dyn shapes::IShape>,
                )
            }
            _ => ::core::option::Option::None,
        }
    }
}
impl ::mmg_typereg::TypeRegistry for ShapesRegistry {
    type Item = ::std::boxed::Box<dyn shapes::IShape>;
    const NAME: &'static str = "shapes";
    fn names() -> &'static [&'static str] {
        ShapesRegistry::NAMES
    }
    fn all() -> ::std::vec::Vec<Self::Item> {
        ShapesRegistry::all()
    }
    fn by_name(name: &str) -> ::core::option::Option<Self::Item> {
        ShapesRegistry::by_name(name)
    }
}
::mmg_typereg::inventory::submit! {
    ::mmg_typereg::RegistryEntry { name : "shapes", options : ShapesRegistry::NAMES }
}
impl shapes::Shapes {
    pub fn registry() -> ShapesRegistry {
        ShapesRegistry
    }
}
