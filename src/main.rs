#[rocket::launch]
fn rocket() -> _ {
    concept_server::rocket()
}
