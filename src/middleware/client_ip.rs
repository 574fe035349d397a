use std::net::SocketAddr;

/// 리스너가 요청 extensions에 붙이는 원격 주소
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub SocketAddr);

/// 요청을 보낸 클라이언트 IP를 추출합니다.
///
/// X-Real-IP, X-Forwarded-For의 첫 번째 값, 소켓 주소 순으로 확인합니다.
pub fn request_ip<B>(req: &hyper::Request<B>) -> String {
    if let Some(real_ip) = req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
    {
        return real_ip.trim().to_string();
    }

    if let Some(forwarded) = req.headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }

    peer_ip(req)
}

/// 소켓 주소만 사용한 클라이언트 IP. 클라이언트가 헤더로 바꿀 수 없습니다.
pub fn peer_ip<B>(req: &hyper::Request<B>) -> String {
    req.extensions()
        .get::<ClientAddr>()
        .map(|addr| addr.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_precedence() {
        let req = hyper::Request::builder()
            .header("x-forwarded-for", "10.0.0.1, 10.0.0.2")
            .header("x-real-ip", "192.168.1.7")
            .body(())
            .unwrap();
        assert_eq!(request_ip(&req), "192.168.1.7");

        let req = hyper::Request::builder()
            .header("x-forwarded-for", "10.0.0.1, 10.0.0.2")
            .body(())
            .unwrap();
        assert_eq!(request_ip(&req), "10.0.0.1");
    }

    #[test]
    fn test_socket_fallback() {
        let mut req = hyper::Request::new(());
        assert_eq!(request_ip(&req), "unknown");

        req.extensions_mut().insert(ClientAddr("127.0.0.1:5000".parse().unwrap()));
        assert_eq!(request_ip(&req), "127.0.0.1");
    }

    #[test]
    fn test_peer_ip_ignores_headers() {
        let mut req = hyper::Request::builder()
            .header("x-real-ip", "192.168.1.7")
            .header("x-forwarded-for", "10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(peer_ip(&req), "unknown");

        req.extensions_mut().insert(ClientAddr("172.16.0.9:41000".parse().unwrap()));
        assert_eq!(peer_ip(&req), "172.16.0.9");
    }
}
