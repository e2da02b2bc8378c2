#![allow(dead_code)]

use bytes::Bytes;
use http_body_util::Empty;
use hyper::{body::Incoming, server::conn::http1, service::service_fn, Request, Response};
use hyper_util::rt::TokioIo;
use openssl::{
    asn1::Asn1Time,
    bn::BigNum,
    hash::MessageDigest,
    pkey::PKey,
    rsa::Rsa,
    ssl::{Ssl, SslAcceptor, SslMethod},
    x509::{X509NameBuilder, X509},
};
use parking_lot::Mutex;
use std::{collections::HashMap, convert::Infallible, net::SocketAddr, pin::Pin, sync::Arc};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpListener,
};
use tokio_openssl::SslStream;

/// A stand-in API server that authorizes requests from a fixed grant table.
///
/// Requests without a known bearer token get a 401, known tokens get a 200
/// for granted paths and a 403 otherwise.
#[derive(Clone, Default)]
pub struct ApiServer {
    grants: Arc<HashMap<String, Vec<String>>>,
    requests: Arc<Mutex<Vec<Seen>>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seen {
    pub path: String,
    pub authorization: Option<String>,
}

impl ApiServer {
    pub fn new(grants: impl IntoIterator<Item = (&'static str, Vec<&'static str>)>) -> Self {
        Self {
            grants: Arc::new(
                grants
                    .into_iter()
                    .map(|(token, paths)| {
                        (
                            token.to_string(),
                            paths.into_iter().map(String::from).collect(),
                        )
                    })
                    .collect(),
            ),
            requests: Default::default(),
        }
    }

    /// Serves plain HTTP on an ephemeral local port and returns the endpoint
    /// URL.
    pub async fn spawn(&self) -> String {
        let addr = self.serve(None).await;
        format!("http://{addr}")
    }

    /// Serves HTTPS with a freshly generated self-signed certificate and
    /// returns the endpoint URL.
    pub async fn spawn_tls(&self) -> String {
        let addr = self.serve(Some(self_signed_acceptor())).await;
        format!("https://{addr}")
    }

    pub fn requests(&self) -> Vec<Seen> {
        self.requests.lock().clone()
    }

    async fn serve(&self, tls: Option<SslAcceptor>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("must bind listener");
        let addr = listener.local_addr().expect("must have a local address");
        let server = self.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let server = server.clone();
                let tls = tls.clone();
                tokio::spawn(async move {
                    let Some(acceptor) = tls else {
                        return server.serve_connection(stream).await;
                    };
                    let ssl = Ssl::new(acceptor.context()).expect("must create session");
                    let mut stream = SslStream::new(ssl, stream).expect("must wrap stream");
                    if Pin::new(&mut stream).accept().await.is_ok() {
                        server.serve_connection(stream).await;
                    }
                });
            }
        });
        addr
    }

    async fn serve_connection<I>(self, io: I)
    where
        I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let svc = service_fn(move |req| {
            let server = self.clone();
            async move { Ok::<_, Infallible>(server.handle(req)) }
        });
        let _ = http1::Builder::new()
            .serve_connection(TokioIo::new(io), svc)
            .await;
    }

    fn handle(&self, req: Request<Incoming>) -> Response<Empty<Bytes>> {
        let path = req.uri().path().to_string();
        let authorization = req
            .headers()
            .get(hyper::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.requests.lock().push(Seen {
            path: path.clone(),
            authorization: authorization.clone(),
        });

        let token = authorization
            .as_deref()
            .and_then(|v| v.strip_prefix("Bearer "));
        let status = match token.and_then(|t| self.grants.get(t)) {
            None => 401,
            Some(paths) if paths.contains(&path) => 200,
            Some(_) => 403,
        };
        Response::builder()
            .status(status)
            .body(Empty::new())
            .unwrap()
    }
}

/// Returns an endpoint on which nothing is listening.
pub async fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind listener");
    let addr: SocketAddr = listener.local_addr().expect("must have a local address");
    drop(listener);
    format!("http://{addr}")
}

/// Builds a TLS acceptor for a certificate that no client trusts.
fn self_signed_acceptor() -> SslAcceptor {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "localhost").unwrap();
    let name = name.build();

    let mut cert = X509::builder().unwrap();
    cert.set_version(2).unwrap();
    cert.set_subject_name(&name).unwrap();
    cert.set_issuer_name(&name).unwrap();
    cert.set_pubkey(&key).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    cert.set_serial_number(&serial).unwrap();
    cert.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    cert.set_not_after(&Asn1Time::days_from_now(1).unwrap()).unwrap();
    cert.sign(&key, MessageDigest::sha256()).unwrap();
    let cert = cert.build();

    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&key).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    acceptor.check_private_key().unwrap();
    acceptor.build()
}
