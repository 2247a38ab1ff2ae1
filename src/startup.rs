use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    routes::{default_route, lead_route},
    services::{DroidBay, LeadScanner},
};

pub fn run(listener: TcpListener, scanner: LeadScanner<DroidBay>) -> Result<Server, std::io::Error> {
    let scanner = web::Data::new(scanner);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(web::scope("/leads").service(lead_route::get_leads))
            .app_data(scanner.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
