mod msgs;
mod parse;

use proc_macro::TokenStream;
use quote::quote;
use syn::Item;

use msgs::{ERR_COLLECTION_TARGET, ERR_GENERATED_NO_ARGS, ERR_NAME_MISSING, ERR_OPTION_TARGET};
use parse::{CollectionArgs, OptionArgs};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Collection,
    TransitiveCollection,
    RegistryOption,
    Generated,
}

// 参数与目标均只做校验：属性本身不改变被标注的条目，注册表由生成器离线产出
fn check(kind: AttrKind, args: proc_macro2::TokenStream, item: &Item) -> syn::Result<()> {
    match kind {
        AttrKind::Collection | AttrKind::TransitiveCollection => {
            let ident = match item {
                Item::Struct(s) => &s.ident,
                Item::Enum(e) => &e.ident,
                Item::Trait(t) => &t.ident,
                _ => return Err(syn::Error::new_spanned(item, ERR_COLLECTION_TARGET)),
            };
            match syn::parse2::<CollectionArgs>(args)?.name {
                Some(_) => Ok(()),
                None => Err(syn::Error::new(ident.span(), ERR_NAME_MISSING)),
            }
        }
        AttrKind::RegistryOption => {
            if !matches!(item, Item::Struct(_) | Item::Enum(_)) {
                return Err(syn::Error::new_spanned(item, ERR_OPTION_TARGET));
            }
            syn::parse2::<OptionArgs>(args).map(drop)
        }
        AttrKind::Generated => {
            if args.is_empty() {
                Ok(())
            } else {
                Err(syn::Error::new_spanned(args, ERR_GENERATED_NO_ARGS))
            }
        }
    }
}

pub fn entrypoint(kind: AttrKind, args: TokenStream, input: TokenStream) -> TokenStream {
    let input = proc_macro2::TokenStream::from(input);
    let item: Item = match syn::parse2(input.clone()) {
        Ok(item) => item,
        Err(e) => return e.to_compile_error().into(),
    };
    match check(kind, args.into(), &item) {
        Ok(()) => input.into(),
        // 出错时仍输出原条目
        Err(e) => {
            let err = e.to_compile_error();
            quote! { #err #input }.into()
        }
    }
}
