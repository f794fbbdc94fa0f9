// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, LitInt, LitStr, Token};

/// Version scope of one declaration: `min_version` inclusive,
/// `max_version` exclusive, `version` exact.
#[derive(Clone, Copy, Default)]
struct Range {
    min: Option<f64>,
    max: Option<f64>,
    exact: Option<f64>,
}

impl Range {
    /// Consume a range key; `Ok(false)` if `meta` is something else.
    fn parse(&mut self, meta: &ParseNestedMeta) -> syn::Result<bool> {
        if meta.path.is_ident("min_version") {
            self.min = Some(version_value(meta)?);
        } else if meta.path.is_ident("max_version") {
            self.max = Some(version_value(meta)?);
        } else if meta.path.is_ident("version") {
            self.exact = Some(version_value(meta)?);
        } else {
            return Ok(false);
        }
        Ok(true)
    }

    fn is_any(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.exact.is_none()
    }

    fn tokens(&self) -> TokenStream2 {
        match (self.exact, self.min, self.max) {
            (Some(v), _, _) => quote! { ::binform::VersionRange::exact(#v) },
            (None, Some(min), Some(max)) => quote! { ::binform::VersionRange::between(#min, #max) },
            (None, Some(min), None) => quote! { ::binform::VersionRange::since(#min) },
            (None, None, Some(max)) => quote! { ::binform::VersionRange::until(#max) },
            (None, None, None) => quote! { ::binform::VersionRange::any() },
        }
    }
}

/// A value restricted to a version range.
struct Scoped<T> {
    value: T,
    range: Range,
}

fn version_value(meta: &ParseNestedMeta) -> syn::Result<f64> {
    match meta.value()?.parse::<Lit>()? {
        Lit::Int(lit) => lit.base10_parse::<f64>(),
        Lit::Float(lit) => lit.base10_parse::<f64>(),
        other => Err(syn::Error::new_spanned(other, "expected a version number")),
    }
}

fn int_value<N>(meta: &ParseNestedMeta) -> syn::Result<N>
where
    N: std::str::FromStr,
    N::Err: std::fmt::Display,
{
    meta.value()?.parse::<LitInt>()?.base10_parse::<N>()
}

fn str_value(meta: &ParseNestedMeta) -> syn::Result<LitStr> {
    meta.value()?.parse::<LitStr>()
}

fn byte_order_value(meta: &ParseNestedMeta) -> syn::Result<TokenStream2> {
    let lit = str_value(meta)?;
    match lit.value().to_ascii_lowercase().as_str() {
        "big" | "be" | "big_endian" => Ok(quote! { ::binform::ByteOrder::BigEndian }),
        "little" | "le" | "little_endian" => Ok(quote! { ::binform::ByteOrder::LittleEndian }),
        _ => Err(syn::Error::new_spanned(lit, "expected \"big\" or \"little\"")),
    }
}

fn wire_type(lit: &LitStr) -> syn::Result<TokenStream2> {
    let variant = match lit.value().to_ascii_lowercase().as_str() {
        "bool" => quote! { Bool },
        "i8" => quote! { I8 },
        "u8" => quote! { U8 },
        "i16" => quote! { I16 },
        "u16" => quote! { U16 },
        "i32" => quote! { I32 },
        "u32" => quote! { U32 },
        "i64" => quote! { I64 },
        "u64" => quote! { U64 },
        "f16" => quote! { F16 },
        "f32" => quote! { F32 },
        "f64" => quote! { F64 },
        "guid" => quote! { Guid },
        _ => return Err(syn::Error::new_spanned(lit, "unknown wire type")),
    };
    Ok(quote! { ::binform::WireType::#variant })
}

fn wire_type_value(meta: &ParseNestedMeta) -> syn::Result<TokenStream2> {
    wire_type(&str_value(meta)?)
}

/// Parse `key = value` or `key(value = .., min_version = .., ..)`.
fn parse_scoped<T>(
    meta: &ParseNestedMeta,
    value: impl Fn(&ParseNestedMeta) -> syn::Result<T>,
) -> syn::Result<Scoped<T>> {
    if meta.input.peek(Token![=]) {
        return Ok(Scoped {
            value: value(meta)?,
            range: Range::default(),
        });
    }
    let mut parsed = None;
    let mut range = Range::default();
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("value") {
            parsed = Some(value(&inner)?);
            Ok(())
        } else if range.parse(&inner)? {
            Ok(())
        } else {
            Err(inner.error("expected `value`, `min_version`, `max_version` or `version`"))
        }
    })?;
    let value = parsed.ok_or_else(|| meta.error("missing `value`"))?;
    Ok(Scoped { value, range })
}

/// Parse a bare flag or `key(min_version = .., ..)`.
fn parse_flag(meta: &ParseNestedMeta) -> syn::Result<Range> {
    let mut range = Range::default();
    if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| {
            if range.parse(&inner)? {
                Ok(())
            } else {
                Err(inner.error("expected `min_version`, `max_version` or `version`"))
            }
        })?;
    }
    Ok(range)
}

#[derive(Default)]
struct StructAttrs {
    sizes: Vec<Scoped<u64>>,
    byte_orders: Vec<Scoped<TokenStream2>>,
    positional: bool,
    factory: Option<syn::Path>,
    no_default: bool,
}

impl StructAttrs {
    fn parse(attrs: &[syn::Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("binform")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("size") {
                    parsed.sizes.push(parse_scoped(&meta, int_value::<u64>)?);
                } else if meta.path.is_ident("byte_order") {
                    parsed.byte_orders.push(parse_scoped(&meta, byte_order_value)?);
                } else if meta.path.is_ident("positional") {
                    parsed.positional = true;
                } else if meta.path.is_ident("factory") {
                    parsed.factory = Some(str_value(&meta)?.parse::<syn::Path>()?);
                } else if meta.path.is_ident("no_default") {
                    parsed.no_default = true;
                } else {
                    return Err(meta.error("unknown structure attribute"));
                }
                Ok(())
            })?;
        }
        Ok(parsed)
    }
}

#[derive(Default)]
struct FieldAttrs {
    offsets: Vec<Scoped<u64>>,
    byte_orders: Vec<Scoped<TokenStream2>>,
    store_types: Vec<Scoped<TokenStream2>>,
    size_cursors: Vec<Range>,
    applicability: Range,
    version_number: bool,
    length_prefixed: bool,
    fixed_length: Option<usize>,
    trim: bool,
    padding: Option<u8>,
    null_terminated: Option<Option<usize>>,
    count: Option<usize>,
    count_type: Option<TokenStream2>,
    skip: bool,
}

impl FieldAttrs {
    fn parse(field: &syn::Field) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("binform")) {
            attr.parse_nested_meta(|meta| {
                let path = &meta.path;
                if path.is_ident("offset") {
                    parsed.offsets.push(parse_scoped(&meta, int_value::<u64>)?);
                } else if path.is_ident("byte_order") {
                    parsed.byte_orders.push(parse_scoped(&meta, byte_order_value)?);
                } else if path.is_ident("store_type") {
                    parsed.store_types.push(parse_scoped(&meta, wire_type_value)?);
                } else if path.is_ident("size_cursor") || path.is_ident("data_length") {
                    parsed.size_cursors.push(parse_flag(&meta)?);
                } else if path.is_ident("version_number") {
                    parsed.version_number = true;
                } else if path.is_ident("length_prefixed") {
                    parsed.length_prefixed = true;
                } else if path.is_ident("fixed_length") {
                    parsed.fixed_length = Some(int_value(&meta)?);
                } else if path.is_ident("trim") {
                    parsed.trim = true;
                } else if path.is_ident("padding") {
                    parsed.padding = Some(int_value(&meta)?);
                } else if path.is_ident("null_terminated") {
                    let max = if meta.input.peek(Token![=]) {
                        Some(int_value(&meta)?)
                    } else {
                        None
                    };
                    parsed.null_terminated = Some(max);
                } else if path.is_ident("count") {
                    parsed.count = Some(int_value(&meta)?);
                } else if path.is_ident("count_type") {
                    parsed.count_type = Some(wire_type_value(&meta)?);
                } else if path.is_ident("skip") {
                    parsed.skip = true;
                } else if parsed.applicability.parse(&meta)? {
                    // min_version / max_version / version
                } else {
                    return Err(meta.error("unknown field attribute"));
                }
                Ok(())
            })?;
        }
        if parsed.count.is_some() && parsed.count_type.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "`count` and `count_type` are mutually exclusive",
            ));
        }
        Ok(parsed)
    }

    /// `FieldBuilder` call chain for this field.
    fn builder(&self, name: &str, ty: &syn::Type) -> TokenStream2 {
        let mut chain = quote! { ::binform::FieldBuilder::of::<#ty>(#name) };
        for Scoped { value, range } in &self.offsets {
            let range = range.tokens();
            chain = quote! { #chain.offset_for(#value, #range) };
        }
        for Scoped { value, range } in &self.byte_orders {
            let range = range.tokens();
            chain = quote! { #chain.byte_order_for(#value, #range) };
        }
        for Scoped { value, range } in &self.store_types {
            let range = range.tokens();
            chain = quote! { #chain.store_type_for(#value, #range) };
        }
        for range in &self.size_cursors {
            let range = range.tokens();
            chain = quote! { #chain.size_cursor_for(#range) };
        }
        if !self.applicability.is_any() {
            let range = self.applicability.tokens();
            chain = quote! { #chain.applies(#range) };
        }
        if self.version_number {
            chain = quote! { #chain.version_number() };
        }
        if self.length_prefixed {
            chain = quote! { #chain.length_prefixed() };
        }
        if let Some(length) = self.fixed_length {
            chain = quote! { #chain.fixed_length(#length) };
        }
        if self.trim {
            chain = quote! { #chain.trim() };
        }
        if let Some(padding) = self.padding {
            chain = quote! { #chain.padding(#padding) };
        }
        match self.null_terminated {
            Some(Some(max)) => chain = quote! { #chain.null_terminated(Some(#max)) },
            Some(None) => chain = quote! { #chain.null_terminated(None) },
            None => {}
        }
        if let Some(count) = self.count {
            chain = quote! { #chain.count(::binform::CollectionCount::Fixed(#count)) };
        }
        if let Some(wire) = &self.count_type {
            chain = quote! { #chain.count(::binform::CollectionCount::Prefixed(#wire)) };
        }
        chain
    }
}

struct FieldInfo {
    ident: syn::Ident,
    ty: syn::Type,
    attrs: FieldAttrs,
}

/// `#[derive(BinaryObject)]`: generates the layout, field access and a
/// `FieldCodec` so the structure can be nested in other structures.
///
/// Structure attributes (`#[binform(...)]` on the struct):
/// - `size = N` or `size(value = N, min_version = a, max_version = b)`
/// - `byte_order = "big" | "little"` (also version-scoped)
/// - `positional`: fields are read in declaration order and passed to the
///   struct literal
/// - `factory = "path::to::fn"`: zero-argument constructor
/// - `no_default`: the type has no `Default` construction path
///
/// Field attributes:
/// - `offset = N` or `offset(value = N, min_version = .., max_version = .., version = ..)`
/// - `byte_order`, `store_type = "u32"` (both version-scopable)
/// - `min_version`, `max_version`, `version`: field applicability
/// - `length_prefixed`, `fixed_length = N`, `trim`, `padding = N`,
///   `null_terminated`, `null_terminated = N`
/// - `version_number`, `size_cursor` (alias `data_length`, optionally scoped)
/// - `count = N`, `count_type = "u16"` for collections
/// - `skip`: not part of the layout, left at its default value
///
/// Example:
/// ```ignore
/// #[derive(BinaryObject, Default)]
/// #[binform(byte_order = "big")]
/// struct Entry {
///     #[binform(offset = 0, version_number)]
///     version: u16,
///     #[binform(offset = 2, fixed_length = 16, trim)]
///     name: String,
///     #[binform(offset(value = 18, min_version = 2))]
///     flags: u32,
/// }
/// ```
#[proc_macro_derive(BinaryObject, attributes(binform))]
pub fn derive_binary_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_object(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[allow(clippy::too_many_lines)]
fn expand_object(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let type_name = name.to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "generic structures are not supported",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => &f.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Only named fields are supported",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(input, "Only structs are supported")),
    };

    let attrs = StructAttrs::parse(&input.attrs)?;

    let mut infos = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };
        let field_attrs = FieldAttrs::parse(field)?;
        if attrs.positional && !field_attrs.offsets.is_empty() {
            return Err(syn::Error::new_spanned(
                field,
                "positional structures cannot declare offsets",
            ));
        }
        infos.push(FieldInfo {
            ident,
            ty: field.ty.clone(),
            attrs: field_attrs,
        });
    }

    // Layout indices count only fields that are part of the layout.
    let mapped: Vec<(usize, &FieldInfo)> = infos
        .iter()
        .filter(|info| !info.attrs.skip)
        .enumerate()
        .collect();

    // ===== Layout =====
    let mut layout = quote! { ::binform::LayoutBuilder::new(#type_name) };
    for Scoped { value, range } in &attrs.sizes {
        let range = range.tokens();
        layout = quote! { #layout.size_for(#value, #range) };
    }
    for Scoped { value, range } in &attrs.byte_orders {
        let range = range.tokens();
        layout = quote! { #layout.byte_order_for(#value, #range) };
    }
    if attrs.positional {
        layout = quote! { #layout.positional() };
    }
    if attrs.factory.is_some() {
        layout = quote! { #layout.factory() };
    }
    // A factory or positional constructor replaces `Default`.
    let has_default = !attrs.no_default && !attrs.positional && attrs.factory.is_none();
    if !has_default {
        layout = quote! { #layout.without_default() };
    }
    for (_, info) in &mapped {
        let builder = info.attrs.builder(&info.ident.to_string(), &info.ty);
        layout = quote! { #layout.field(#builder) };
    }

    // ===== Field access =====
    let read_arms = mapped.iter().map(|(index, info)| {
        let ident = &info.ident;
        let ty = &info.ty;
        quote! {
            #index => {
                self.#ident = <#ty as ::binform::FieldCodec>::decode(reader, field, ctx)?;
            }
        }
    });
    let write_arms = mapped.iter().map(|(index, info)| {
        let ident = &info.ident;
        quote! { #index => ::binform::FieldCodec::encode(&self.#ident, writer, field, ctx), }
    });
    let scalar_arms = mapped.iter().map(|(index, info)| {
        let ident = &info.ident;
        quote! { #index => ::binform::FieldCodec::as_scalar(&self.#ident), }
    });

    // ===== Construction =====
    let factory_arm = attrs.factory.as_ref().map(|path| {
        quote! { ::binform::ConstructionStrategy::FactoryMethod => Some(#path()), }
    });
    let default_arm = has_default.then(|| {
        quote! {
            ::binform::ConstructionStrategy::PropertyAssignment => {
                Some(<Self as ::std::default::Default>::default())
            }
        }
    });

    let positional = attrs.positional.then(|| {
        let mut index = 0usize;
        let inits = infos.iter().map(|info| {
            let ident = &info.ident;
            let ty = &info.ty;
            if info.attrs.skip {
                return quote! { #ident: ::std::default::Default::default() };
            }
            let current = index;
            index += 1;
            quote! {
                #ident: match layout.field(#current) {
                    Some(field) => {
                        ::binform::walker::read_positional_field::<#ty, R>(reader, layout, field, ctx)?
                    }
                    None => ::std::default::Default::default(),
                }
            }
        });
        let inits: Vec<_> = inits.collect();
        quote! {
            fn read_positional<R: ::std::io::Read + ::std::io::Seek>(
                layout: &::binform::ResolvedLayout,
                reader: &mut ::binform::EndianReader<R>,
                ctx: &::binform::Context<'_>,
            ) -> ::binform::Result<Self> {
                Ok(Self { #(#inits,)* })
            }
        }
    });

    Ok(quote! {
        impl ::binform::FieldAccess for #name {
            fn read_field<R: ::std::io::Read + ::std::io::Seek>(
                &mut self,
                index: usize,
                reader: &mut ::binform::EndianReader<R>,
                field: &::binform::ResolvedField,
                ctx: &::binform::Context<'_>,
            ) -> ::binform::Result<()> {
                match index {
                    #(#read_arms)*
                    _ => {}
                }
                Ok(())
            }

            fn write_field<W: ::std::io::Write + ::std::io::Seek>(
                &self,
                index: usize,
                writer: &mut ::binform::EndianWriter<W>,
                field: &::binform::ResolvedField,
                ctx: &::binform::Context<'_>,
            ) -> ::binform::Result<()> {
                match index {
                    #(#write_arms)*
                    _ => Ok(()),
                }
            }

            fn field_scalar(&self, index: usize) -> Option<::binform::Scalar> {
                match index {
                    #(#scalar_arms)*
                    _ => None,
                }
            }
        }

        impl ::binform::BinaryObject for #name {
            fn layout() -> ::binform::Result<&'static ::binform::StructureLayout> {
                static LAYOUT: ::std::sync::OnceLock<::binform::Result<::binform::StructureLayout>> =
                    ::std::sync::OnceLock::new();
                LAYOUT
                    .get_or_init(|| #layout.build())
                    .as_ref()
                    .map_err(::std::clone::Clone::clone)
            }

            #[allow(unreachable_patterns)]
            fn instantiate(strategy: ::binform::ConstructionStrategy) -> Option<Self> {
                match strategy {
                    #factory_arm
                    #default_arm
                    _ => None,
                }
            }

            #positional
        }

        impl ::binform::FieldCodec for #name {
            fn field_kind() -> ::binform::FieldKind {
                ::binform::FieldKind::Object {
                    type_name: ::std::string::String::from(#type_name),
                    layout: None,
                }
            }

            fn decode<R: ::std::io::Read + ::std::io::Seek>(
                reader: &mut ::binform::EndianReader<R>,
                field: &::binform::ResolvedField,
                ctx: &::binform::Context<'_>,
            ) -> ::binform::Result<Self> {
                ::binform::walker::decode_nested::<Self, R>(reader, field, ctx)
            }

            fn encode<W: ::std::io::Write + ::std::io::Seek>(
                &self,
                writer: &mut ::binform::EndianWriter<W>,
                field: &::binform::ResolvedField,
                ctx: &::binform::Context<'_>,
            ) -> ::binform::Result<()> {
                ::binform::walker::encode_nested(self, writer, field, ctx)
            }
        }
    })
}

/// `#[derive(BinaryEnum)]`: maps a fieldless enum onto its discriminant.
///
/// The underlying wire type comes from `#[repr(..)]`, or from
/// `#[binform(underlying = "u16")]`, and defaults to `i32`. Unknown
/// discriminants are a data error on decode.
#[proc_macro_derive(BinaryEnum, attributes(binform))]
pub fn derive_binary_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_enum(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn enum_underlying(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let mut underlying = None;
    for attr in &input.attrs {
        if attr.path().is_ident("binform") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("underlying") {
                    underlying = Some(wire_type_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unknown enum attribute"))
                }
            })?;
        } else if attr.path().is_ident("repr") && underlying.is_none() {
            attr.parse_nested_meta(|meta| {
                if let Some(ident) = meta.path.get_ident() {
                    let repr = LitStr::new(&ident.to_string(), ident.span());
                    if let Ok(wire) = wire_type(&repr) {
                        underlying = Some(wire);
                    }
                }
                Ok(())
            })?;
        }
    }
    Ok(underlying.unwrap_or_else(|| quote! { ::binform::WireType::I32 }))
}

fn expand_enum(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let type_name = name.to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "generic enums are not supported",
        ));
    }
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(input, "Only enums are supported"));
    };

    let mut variants = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "BinaryEnum variants cannot carry data",
            ));
        }
        variants.push(&variant.ident);
    }

    let underlying = enum_underlying(input)?;
    let from_arms = variants.iter().map(|variant| {
        quote! { d if d == #name::#variant as i64 => Some(#name::#variant), }
    });
    let to_arms = variants.iter().map(|variant| {
        quote! { #name::#variant => #name::#variant as i64, }
    });

    Ok(quote! {
        impl #name {
            fn __binform_discriminant(&self) -> i64 {
                match self {
                    #(#to_arms)*
                }
            }
        }

        impl ::binform::FieldCodec for #name {
            fn field_kind() -> ::binform::FieldKind {
                ::binform::FieldKind::Enum {
                    type_name: #type_name,
                    underlying: #underlying,
                }
            }

            fn decode<R: ::std::io::Read + ::std::io::Seek>(
                reader: &mut ::binform::EndianReader<R>,
                field: &::binform::ResolvedField,
                _ctx: &::binform::Context<'_>,
            ) -> ::binform::Result<Self> {
                ::binform::codec::read_enum(reader, field, #underlying, #type_name, |discriminant| {
                    match discriminant {
                        #(#from_arms)*
                        _ => None,
                    }
                })
            }

            fn encode<W: ::std::io::Write + ::std::io::Seek>(
                &self,
                writer: &mut ::binform::EndianWriter<W>,
                field: &::binform::ResolvedField,
                _ctx: &::binform::Context<'_>,
            ) -> ::binform::Result<()> {
                ::binform::codec::write_enum(writer, field, #underlying, self.__binform_discriminant())
            }

            fn as_scalar(&self) -> Option<::binform::Scalar> {
                Some(::binform::Scalar::Signed(self.__binform_discriminant()))
            }
        }
    })
}
