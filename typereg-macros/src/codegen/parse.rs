use super::msgs::{
    ERR_DUP_KEY, ERR_NAME_DUP, ERR_NAME_EMPTY, ERR_OPTION_UNKNOWN_KEY, ERR_UNKNOWN_KEY,
};
use syn::{
    parse::{Parse, ParseStream},
    Ident, LitBool, LitInt, LitStr, Token, Type,
};

// 集合注解参数：name 必填（具名或首个位置字符串），其余可选。
// 宏只做校验；取值由生成器从符号图读取，这里只保留 check 需要的 name

pub struct CollectionArgs {
    pub name: Option<LitStr>,
}

// `flag` 或 `flag = true|false`
fn parse_flag(input: ParseStream, key: &Ident, seen: &mut bool) -> syn::Result<()> {
    if std::mem::replace(seen, true) {
        return Err(syn::Error::new(key.span(), ERR_DUP_KEY));
    }
    if input.peek(Token![=]) {
        input.parse::<Token![=]>()?;
        input.parse::<LitBool>()?;
    }
    Ok(())
}

impl Parse for CollectionArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut name: Option<LitStr> = None;
        let mut return_type = false;
        let mut by_id = false;
        let mut accessors = false;
        while !input.is_empty() {
            if input.peek(LitStr) {
                let lit: LitStr = input.parse()?;
                if name.replace(lit.clone()).is_some() {
                    return Err(syn::Error::new(lit.span(), ERR_NAME_DUP));
                }
            } else {
                let key: Ident = input.parse()?;
                match key.to_string().as_str() {
                    "name" => {
                        input.parse::<Token![=]>()?;
                        let lit: LitStr = input.parse()?;
                        if name.replace(lit).is_some() {
                            return Err(syn::Error::new(key.span(), ERR_NAME_DUP));
                        }
                    }
                    "return_type" => {
                        input.parse::<Token![=]>()?;
                        input.parse::<Type>()?;
                        if std::mem::replace(&mut return_type, true) {
                            return Err(syn::Error::new(key.span(), ERR_DUP_KEY));
                        }
                    }
                    "by_id" => parse_flag(input, &key, &mut by_id)?,
                    "accessors" => parse_flag(input, &key, &mut accessors)?,
                    _ => return Err(syn::Error::new(key.span(), ERR_UNKNOWN_KEY)),
                }
            }
            if input.is_empty() {
                break;
            }
            input.parse::<Token![,]>()?;
        }
        if let Some(lit) = &name {
            if lit.value().trim().is_empty() {
                return Err(syn::Error::new(lit.span(), ERR_NAME_EMPTY));
            }
        }
        Ok(Self { name })
    }
}

// 选项注解：全部可选，缺省即无额外元数据
pub struct OptionArgs;

impl Parse for OptionArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let (mut name, mut id) = (false, false);
        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let seen = match key.to_string().as_str() {
                "name" => {
                    let lit: LitStr = input.parse()?;
                    if lit.value().trim().is_empty() {
                        return Err(syn::Error::new(lit.span(), ERR_NAME_EMPTY));
                    }
                    &mut name
                }
                "id" => {
                    input.parse::<LitInt>()?.base10_parse::<u32>()?;
                    &mut id
                }
                _ => return Err(syn::Error::new(key.span(), ERR_OPTION_UNKNOWN_KEY)),
            };
            if std::mem::replace(seen, true) {
                return Err(syn::Error::new(key.span(), ERR_DUP_KEY));
            }
            if input.is_empty() {
                break;
            }
            input.parse::<Token![,]>()?;
        }
        Ok(OptionArgs)
    }
}
