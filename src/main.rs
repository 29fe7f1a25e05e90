#[macro_use]
extern crate rocket;

#[launch]
fn app() -> _ {
    catalog_server::rocket()
}
