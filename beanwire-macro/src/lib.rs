use proc_macro::TokenStream;

mod bean;
mod transactional;

/// Derive macro for making a struct a bean of the container
///
/// Every field typed `Autowired<T>` becomes an injection point; other fields
/// start from `Default::default()` unless a factory is given.
///
/// # Attributes
/// - `#[bean(service)]`, `repository`, `controller`, `component`: register the
///   type for `ClassPathScanner`
/// - `#[bean(implements(UserDao, Auditable))]`: resolvable as `dyn UserDao`, ...
/// - `#[bean(factory = "Self::create")]`: zero-argument constructor returning
///   `beanwire::Result<Self>`
///
/// # Example
/// ```ignore
/// use beanwire::{Autowired, Bean};
///
/// #[derive(Bean)]
/// #[bean(service)]
/// pub struct UserService {
///     repository: Autowired<dyn UserRepository>,
/// }
/// ```
#[proc_macro_derive(Bean, attributes(bean))]
pub fn derive_bean(input: TokenStream) -> TokenStream {
    bean::derive_bean(input)
}

/// Wraps an async method so its body runs at a transaction boundary
///
/// The method must take `&self`, return `Result<T, E>` with
/// `E: From<beanwire::BeanwireError>`, and find its manager in a field
/// (`transaction_manager` unless `manager = field` says otherwise).
///
/// # Example
/// ```ignore
/// #[transactional(propagation = RequiresNew, isolation = Serializable)]
/// async fn save_user(&self, user: User) -> Result<User> { ... }
/// ```
#[proc_macro_attribute]
pub fn transactional(attr: TokenStream, item: TokenStream) -> TokenStream {
    transactional::transactional_attribute(attr, item)
}
